use reqbind as bind;
use reqbind::{
    BindError, BindErrorKind, Binder, Facet, PathParams, PresenceTable, Request, RequestContext,
    Section,
};

fn bind<T: Facet<'static> + Default>(req: &impl RequestContext) -> Result<T, BindError> {
    let mut target = T::default();
    Binder::new().bind(&mut target, req)?;
    Ok(target)
}

#[derive(Facet, Default, Debug)]
struct Search {
    query: SearchQuery,
}

#[derive(Facet, Default, Debug)]
struct SearchQuery {
    q: String,
    page: Option<u32>,
    tags: Vec<String>,
    #[facet(bind::readonly)]
    internal: String,
}

#[reqbind_testhelpers::test]
fn query_scalars_take_the_first_value() {
    let req = Request::get("/search?q=first&q=second&page=2&unknown=1");
    let search: Search = bind(&req).unwrap();
    assert_eq!(search.query.q, "first");
    assert_eq!(search.query.page, Some(2));
    assert!(search.query.tags.is_empty());
}

#[reqbind_testhelpers::test]
fn query_lists_are_replaced() {
    let req = Request::get("/search?tags=b&tags=a");
    let mut search = Search::default();
    search.query.tags = vec!["stale".into()];
    Binder::new().bind(&mut search, &req).unwrap();
    assert_eq!(search.query.tags, ["b", "a"]);
}

#[reqbind_testhelpers::test]
fn failed_lists_keep_their_old_values() {
    #[derive(Facet, Default, Debug)]
    struct Ids {
        query: IdsQuery,
    }

    #[derive(Facet, Default, Debug)]
    struct IdsQuery {
        ids: Vec<u32>,
    }

    let req = Request::get("/ids?ids=1&ids=x&ids=3");
    let mut target = Ids::default();
    target.query.ids = vec![7, 8];
    let err = Binder::new().bind(&mut target, &req).unwrap_err();
    insta::assert_snapshot!(err, @"cannot bind param `ids` at `query`: invalid value `x` for `u32`: invalid digit found in string");
    assert_eq!(target.query.ids, [7, 8]);
}

#[reqbind_testhelpers::test]
fn unsigned_params_take_no_sign() {
    #[derive(Facet, Default, Debug)]
    struct Count {
        query: CountQuery,
    }

    #[derive(Facet, Default, Debug)]
    struct CountQuery {
        n: u32,
        delta: i32,
    }

    let err = bind::<Count>(&Request::get("/count?n=%2B5")).unwrap_err();
    insta::assert_snapshot!(err, @"cannot bind param `n` at `query`: invalid value `+5` for `u32`: invalid digit found in string");

    let count: Count = bind(&Request::get("/count?delta=%2B5")).unwrap();
    assert_eq!(count.query.delta, 5);
}

#[reqbind_testhelpers::test]
fn query_is_rejected_for_methods_with_a_body() {
    let req = Request::post("/search?q=x");
    let err = bind::<Search>(&req).unwrap_err();
    assert!(matches!(
        err.kind(),
        BindErrorKind::UnsupportedMethod {
            location: Section::Query,
            ..
        }
    ));
    insta::assert_snapshot!(err, @"unsupported http method `POST` at `query`");

    for req in [Request::delete("/search?q=x"), Request::head("/search?q=x")] {
        assert_eq!(bind::<Search>(&req).unwrap().query.q, "x");
    }
}

#[reqbind_testhelpers::test]
fn readonly_slots_cannot_be_bound() {
    let req = Request::get("/search?internal=x");
    let err = bind::<Search>(&req).unwrap_err();
    insta::assert_snapshot!(err, @"param `internal` at `query` is not settable");
}

#[reqbind_testhelpers::test]
fn coercion_errors_name_the_param() {
    let req = Request::get("/search?page=two");
    let err = bind::<Search>(&req).unwrap_err();
    assert!(matches!(err.kind(), BindErrorKind::Coercion { .. }));
    assert!(core::error::Error::source(&err).is_some());
    insta::assert_snapshot!(err, @"cannot bind param `page` at `query`: invalid value `two` for `u32`: invalid digit found in string");
}

#[derive(Facet, Default, Debug)]
struct Traced {
    header: TraceHeaders,
}

#[derive(Facet, Default, Debug)]
struct TraceHeaders {
    #[facet(rename = "X-Request-Id")]
    request_id: String,
    #[facet(rename = "X-Retries")]
    retries: u8,
    #[facet(rename = "X-Sampled")]
    sampled: Option<bool>,
}

#[reqbind_testhelpers::test]
fn headers_are_case_insensitive() {
    let req = Request::get("/")
        .with_header("x-request-id", "abc")
        .with_header("X-RETRIES", "3")
        .with_header("X-Sampled", "");
    let traced: Traced = bind(&req).unwrap();
    assert_eq!(traced.header.request_id, "abc");
    assert_eq!(traced.header.retries, 3);
    assert_eq!(traced.header.sampled, None);
}

#[derive(Facet, Default, Debug)]
struct ListHeader {
    header: ListHeaderFields,
}

#[derive(Facet, Default, Debug)]
struct ListHeaderFields {
    accept: Vec<String>,
}

#[reqbind_testhelpers::test]
fn header_lists_are_unsupported() {
    let req = Request::get("/").with_header("accept", "text/html");
    let err = bind::<ListHeader>(&req).unwrap_err();
    insta::assert_snapshot!(err, @"cannot bind param `accept` at `header`: unknown type `Vec<String>`");
}

#[derive(Facet, Default, Debug)]
struct Login {
    form: LoginForm,
}

#[derive(Facet, Default, Debug)]
struct LoginForm {
    username: String,
    remember: bool,
    scopes: Vec<String>,
}

#[reqbind_testhelpers::test]
fn urlencoded_forms() {
    let req = Request::post("/login").with_form("username=omri&remember=t&scopes=a&scopes=b");
    let login: Login = bind(&req).unwrap();
    assert_eq!(login.form.username, "omri");
    assert!(login.form.remember);
    assert_eq!(login.form.scopes, ["a", "b"]);
}

#[reqbind_testhelpers::test]
fn multipart_forms_use_parsed_params() {
    let req = Request::post("/login")
        .with_header("Content-Type", "multipart/form-data; boundary=xyz")
        .with_body("--xyz--")
        .with_form_param("username", "roy");
    let login: Login = bind(&req).unwrap();
    assert_eq!(login.form.username, "roy");
}

#[reqbind_testhelpers::test]
fn forms_are_skipped_without_a_form_body() {
    let json = Request::post("/login").with_json(r#"{"username":"x"}"#);
    assert_eq!(bind::<Login>(&json).unwrap().form.username, "");

    let empty = Request::post("/login")
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_header("Content-Length", "0")
        .with_body("username=ignored");
    assert_eq!(bind::<Login>(&empty).unwrap().form.username, "");
}

#[reqbind_testhelpers::test]
fn forms_are_rejected_for_get() {
    let req = Request::get("/login").with_form("username=x");
    let err = bind::<Login>(&req).unwrap_err();
    insta::assert_snapshot!(err, @"unsupported http method `GET` at `form`");
}

#[derive(Facet, Default, Debug)]
struct Order {
    body: OrderBody,
    body_sent_fields: PresenceTable,
}

#[derive(Facet, Default, Debug, PartialEq)]
struct OrderBody {
    id: u64,
    items: Vec<Item>,
    note: Option<String>,
}

#[derive(Facet, Default, Debug, PartialEq)]
struct Item {
    sku: String,
    quantity: u16,
}

#[reqbind_testhelpers::test]
fn json_bodies() {
    let req = Request::post("/orders").with_json(
        r#"{"id": 9, "items": [{"sku": "a-1", "quantity": 2}, {"sku": "b-2", "quantity": 1}]}"#,
    );
    let order: Order = bind(&req).unwrap();
    assert_eq!(
        order.body,
        OrderBody {
            id: 9,
            items: vec![
                Item {
                    sku: "a-1".into(),
                    quantity: 2,
                },
                Item {
                    sku: "b-2".into(),
                    quantity: 1,
                },
            ],
            note: None,
        }
    );
    assert!(order.body_sent_fields.exists("items"));
    assert!(!order.body_sent_fields.exists("items.sku"));
    assert!(!order.body_sent_fields.exists("note"));
}

#[reqbind_testhelpers::test]
fn xml_bodies() {
    let req = Request::post("/orders")
        .with_header("Content-Type", "application/xml; charset=utf-8")
        .with_body(
            "<order><id>9</id><note>rush</note>\
             <items><sku>a-1</sku><quantity>2</quantity></items></order>",
        );
    let order: Order = bind(&req).unwrap();
    assert_eq!(order.body.id, 9);
    assert_eq!(order.body.note.as_deref(), Some("rush"));
    assert_eq!(
        order.body.items,
        [Item {
            sku: "a-1".into(),
            quantity: 2,
        }]
    );
    assert!(order.body_sent_fields.exists("items.sku"));
}

#[derive(Facet, Default, Debug)]
struct Shipment {
    body: ShipmentBody,
}

#[derive(Facet, Default, Debug, PartialEq)]
struct ShipmentBody {
    id: u64,
    address: Address,
    items: Vec<Item>,
}

#[derive(Facet, Default, Debug, PartialEq)]
struct Address {
    city: String,
}

#[reqbind_testhelpers::test]
fn empty_xml_elements_are_empty_records() {
    let xml = |body: &'static str| {
        Request::post("/shipments")
            .with_header("Content-Type", "application/xml")
            .with_body(body)
    };

    let shipment: Shipment = bind(&xml("<o><id>1</id><address/></o>")).unwrap();
    assert_eq!(shipment.body.id, 1);
    assert_eq!(shipment.body.address, Address::default());

    let shipment: Shipment = bind(&xml("<o><address></address></o>")).unwrap();
    assert_eq!(shipment.body.address, Address::default());

    let shipment: Shipment = bind(&xml("<o><items/></o>")).unwrap();
    assert_eq!(shipment.body.items, [Item::default()]);
}

#[reqbind_testhelpers::test]
fn unknown_content_types_leave_the_body_alone() {
    let req = Request::post("/orders")
        .with_header("Content-Type", "text/plain")
        .with_body("id=9");
    let order: Order = bind(&req).unwrap();
    assert_eq!(order.body, OrderBody::default());
    assert!(order.body_sent_fields.is_empty());
}

#[reqbind_testhelpers::test]
fn malformed_bodies_are_decode_errors() {
    let req = Request::post("/orders").with_json(r#"{"id": "#);
    let err = bind::<Order>(&req).unwrap_err();
    assert!(matches!(
        err.kind(),
        BindErrorKind::Decode {
            location: Section::Body,
            ..
        }
    ));
}

#[reqbind_testhelpers::test]
fn bodies_are_rejected_for_get() {
    let req = Request::get("/orders").with_json("{}");
    let err = bind::<Order>(&req).unwrap_err();
    insta::assert_snapshot!(err, @"unsupported http method `GET` at `body`");
}

#[derive(Facet, Default, Debug)]
struct BadSentFields {
    body: OrderBody,
    body_sent_fields: String,
}

#[reqbind_testhelpers::test]
fn sent_fields_must_be_a_presence_table() {
    let req = Request::post("/orders").with_json(r#"{"id": 1}"#);
    let err = bind::<BadSentFields>(&req).unwrap_err();
    insta::assert_snapshot!(err, @"binding element at `body_sent_fields` must be a PresenceTable, got `String`");
}

#[derive(Facet, Default, Debug)]
struct ReadonlySentFields {
    body: OrderBody,
    #[facet(bind::readonly)]
    body_sent_fields: PresenceTable,
}

#[reqbind_testhelpers::test]
fn readonly_sent_fields_are_not_settable() {
    let req = Request::post("/orders").with_json(r#"{"id": 1}"#);
    let err = bind::<ReadonlySentFields>(&req).unwrap_err();
    insta::assert_snapshot!(err, @"param `body_sent_fields` at `body` is not settable");
}

#[derive(Facet, Default, Debug)]
struct ScalarBody {
    body: Vec<u32>,
    body_sent_fields: PresenceTable,
}

#[reqbind_testhelpers::test]
fn non_record_bodies_skip_sent_fields() {
    let req = Request::put("/ids").with_json("[3, 1, 2]");
    let target: ScalarBody = bind(&req).unwrap();
    assert_eq!(target.body, [3, 1, 2]);
    assert!(target.body_sent_fields.is_empty());
}

#[derive(Facet, Default, Debug)]
struct Everything {
    path: ItemPath,
    header: TraceHeaders,
    form: LoginForm,
}

#[derive(Facet, Default, Debug)]
struct ItemPath {
    id: u64,
}

#[reqbind_testhelpers::test]
fn http_requests_are_contexts() {
    let mut req = http::Request::builder()
        .method(http::Method::PUT)
        .uri("/items/12")
        .header("X-Request-Id", "r-1")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("username=omri&scopes=read".to_owned())
        .unwrap();
    req.extensions_mut()
        .insert([("id", "12")].into_iter().collect::<PathParams>());

    let target: Everything = bind(&req).unwrap();
    assert_eq!(target.path.id, 12);
    assert_eq!(target.header.request_id, "r-1");
    assert_eq!(target.form.username, "omri");
    assert_eq!(target.form.scopes, ["read"]);
}

#[derive(Facet, Default, Debug)]
struct Lookup {
    path: ItemPath,
    query: SearchQuery,
}

#[reqbind_testhelpers::test]
fn failing_sections_stop_the_ones_after_them() {
    let req = Request::get("/items/x?q=shoes").with_path_param("id", "x");
    let mut target = Lookup::default();
    target.path.id = 4;
    let err = Binder::new().bind(&mut target, &req).unwrap_err();
    insta::assert_snapshot!(err, @"cannot bind param `id` at `path`: invalid value `x` for `u64`: invalid digit found in string");
    assert_eq!(target.path.id, 4);
    assert_eq!(target.query.q, "");
}

#[derive(Facet, Default, Debug)]
struct SkippedPath {
    path: SkippedPathFields,
}

#[derive(Facet, Default, Debug)]
struct SkippedPathFields {
    #[facet(skip)]
    id: u64,
}

#[reqbind_testhelpers::test]
fn skipped_fields_cannot_take_path_params() {
    let req = Request::get("/items/3").with_path_param("id", "3");
    let err = bind::<SkippedPath>(&req).unwrap_err();
    assert!(matches!(err.kind(), BindErrorKind::MissingParam { .. }));
    insta::assert_snapshot!(err, @"missing param `id` at `path`");
}
