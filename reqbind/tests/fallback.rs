use std::sync::atomic::{AtomicUsize, Ordering};

use reqbind::{
    BindError, BindErrorKind, Binder, Facet, FallbackBinder, Hooks, Node, Request, RequestContext,
};

#[derive(Facet, Default, Debug, PartialEq)]
struct Flat {
    #[facet(rename = "Id")]
    id: u32,
    #[facet(rename = "Name")]
    name: String,
    tags: Vec<String>,
}

#[reqbind_testhelpers::test]
fn records_without_sections_bind_flat() {
    let req = Request::get("/users/7?Name=Roy&tags=a&tags=b&Unrelated=1")
        .with_path_param("Id", "7")
        .with_path_param("unused", "x");
    let mut target = Flat::default();
    Binder::new()
        .call_fallback_on_error(true)
        .bind(&mut target, &req)
        .unwrap();
    assert_eq!(
        target,
        Flat {
            id: 7,
            name: "Roy".into(),
            tags: vec!["a".into(), "b".into()],
        }
    );
}

#[reqbind_testhelpers::test]
fn flat_binding_decodes_bodies() {
    let req = Request::post("/users?Name=ignored").with_json(r#"{"Name": "Omri", "tags": ["x"]}"#);
    let mut target = Flat::default();
    Binder::new()
        .call_fallback_on_error(true)
        .bind(&mut target, &req)
        .unwrap();
    assert_eq!(target.name, "Omri");
    assert_eq!(target.tags, ["x"]);
}

#[reqbind_testhelpers::test]
fn flat_binding_reads_form_bodies() {
    let req = Request::post("/users").with_form("Name=Omri&tags=x&tags=y");
    let mut target = Flat::default();
    Binder::new()
        .call_fallback_on_error(true)
        .bind(&mut target, &req)
        .unwrap();
    assert_eq!(target.name, "Omri");
    assert_eq!(target.tags, ["x", "y"]);

    let multipart = Request::put("/users/3")
        .with_path_param("Id", "3")
        .with_header("Content-Type", "multipart/form-data; boundary=b")
        .with_body("--b--")
        .with_form_param("Name", "Roy");
    let mut target = Flat::default();
    Binder::new()
        .call_fallback_on_error(true)
        .bind(&mut target, &multipart)
        .unwrap();
    assert_eq!(target.id, 3);
    assert_eq!(target.name, "Roy");
}

#[reqbind_testhelpers::test]
fn without_fallback_records_without_sections_are_untouched() {
    let req = Request::get("/users?Name=Roy");
    let mut target = Flat::default();
    Binder::new().bind(&mut target, &req).unwrap();
    assert_eq!(target, Flat::default());
}

#[derive(Default)]
struct Counting {
    calls: AtomicUsize,
}

impl FallbackBinder for &'static Counting {
    fn bind(
        &self,
        target: &mut Node,
        _ctx: &dyn RequestContext,
        _hooks: &Hooks,
    ) -> Result<(), BindError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(target.shape().type_identifier, "u64");
        Ok(())
    }
}

#[derive(Facet, Default, Debug)]
struct BadSection {
    header: u8,
}

#[reqbind_testhelpers::test]
fn structural_errors_are_delegated() {
    let counting: &'static Counting = Box::leak(Box::new(Counting::default()));
    let binder = Binder::new()
        .with_fallback(counting)
        .call_fallback_on_error(true);

    let mut scalar = 0u64;
    binder.bind(&mut scalar, &Request::get("/")).unwrap();
    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

    let err = Binder::new()
        .bind(&mut BadSection::default(), &Request::get("/"))
        .unwrap_err();
    assert!(err.is_structural());
    assert!(matches!(
        err.kind(),
        BindErrorKind::InvalidTypeAtLocation {
            location: "header",
            ..
        }
    ));
}

#[reqbind_testhelpers::test]
fn request_errors_are_not_delegated() {
    #[derive(Facet, Default, Debug)]
    struct Strict {
        path: StrictPath,
    }

    #[derive(Facet, Default, Debug)]
    struct StrictPath {
        id: u32,
    }

    let req = Request::get("/").with_path_param("other", "1");
    let err = Binder::new()
        .call_fallback_on_error(true)
        .bind(&mut Strict::default(), &req)
        .unwrap_err();
    assert!(matches!(err.kind(), BindErrorKind::MissingParam { .. }));
}
