use core::fmt;

use reqbind as bind;
use reqbind::{BindErrorKind, Binder, Facet, HookError, ParseParam, ParseText, Request};

/// Comma-separated list, parsed by the type itself.
#[derive(Facet, Default, Debug, PartialEq)]
struct Csv(Vec<String>);

impl ParseParam for Csv {
    fn parse_param(raw: &str) -> Result<Self, HookError> {
        Ok(Csv(raw.split(',').map(str::to_owned).collect()))
    }
}

#[derive(Debug)]
struct BadColor(String);

impl fmt::Display for BadColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is not a #rrggbb color", self.0)
    }
}

impl core::error::Error for BadColor {}

#[derive(Facet, Default, Debug, PartialEq, Clone, Copy)]
struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl ParseText for Color {
    fn parse_text(raw: &[u8]) -> Result<Self, HookError> {
        let text = core::str::from_utf8(raw)?;
        let bad = || BadColor(text.to_owned());
        let hex = text.strip_prefix('#').filter(|hex| hex.len() == 6).ok_or_else(bad)?;
        let channel = |at: usize| u8::from_str_radix(&hex[at..at + 2], 16).map_err(|_| bad());
        Ok(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

#[derive(Facet, Default, Debug)]
struct Theme {
    query: ThemeQuery,
    header: ThemeHeader,
}

#[derive(Facet, Default, Debug)]
struct ThemeQuery {
    #[facet(bind::required)]
    fonts: Csv,
    accent: Option<Color>,
}

#[derive(Facet, Default, Debug)]
struct ThemeHeader {
    #[facet(rename = "X-Background")]
    background: Color,
}

fn binder() -> Binder {
    Binder::new()
        .with_param_hook::<Csv>()
        .with_text_hook::<Color>()
}

#[reqbind_testhelpers::test]
fn hooks_parse_their_own_values() {
    let req = Request::get("/theme?fonts=serif,mono&accent=%23ff8800")
        .with_header("X-Background", "#000010");
    let mut theme = Theme::default();
    binder().bind(&mut theme, &req).unwrap();

    assert_eq!(theme.query.fonts, Csv(vec!["serif".into(), "mono".into()]));
    assert_eq!(
        theme.query.accent,
        Some(Color {
            r: 0xff,
            g: 0x88,
            b: 0x00
        })
    );
    assert_eq!(theme.header.background, Color { r: 0, g: 0, b: 0x10 });
}

#[reqbind_testhelpers::test]
fn hook_errors_are_passed_through() {
    let req = Request::get("/theme?fonts=serif&accent=red");
    let mut theme = Theme::default();
    let err = binder().bind(&mut theme, &req).unwrap_err();
    let BindErrorKind::Coercion { param, source, .. } = err.kind() else {
        panic!("expected a coercion error, got {err}");
    };
    assert_eq!(param, "accent");
    insta::assert_snapshot!(source, @"`red` is not a #rrggbb color");
}

#[reqbind_testhelpers::test]
fn hooked_values_answer_required_checks() {
    let req = Request::get("/theme");
    let mut theme = Theme::default();
    let err = binder().bind(&mut theme, &req).unwrap_err();
    insta::assert_snapshot!(err, @"validation failed: `query.fonts` is required");
}

#[reqbind_testhelpers::test]
fn hooked_values_decode_from_bodies() {
    #[derive(Facet, Default, Debug)]
    struct Paint {
        body: PaintBody,
    }

    #[derive(Facet, Default, Debug)]
    struct PaintBody {
        fill: Color,
        fonts: Csv,
    }

    let req = Request::post("/paint").with_json(r##"{"fill": "#0a0b0c", "fonts": "a,b"}"##);
    let mut paint = Paint::default();
    binder().bind(&mut paint, &req).unwrap();
    assert_eq!(paint.body.fill, Color { r: 10, g: 11, b: 12 });
    assert_eq!(paint.body.fonts, Csv(vec!["a".into(), "b".into()]));
}

#[reqbind_testhelpers::test]
fn unhooked_records_are_not_leaves() {
    let req = Request::get("/theme?fonts=serif");
    let mut theme = Theme::default();
    let err = Binder::new().bind(&mut theme, &req).unwrap_err();
    insta::assert_snapshot!(err, @"validation failed: `query.fonts` is required");
}
