#![doc = include_str!("../README.md")]

use unsynn::*;

keyword! {
    KFn = "fn";
    KAsync = "async";
    KUnsafe = "unsafe";
    KPub = "pub";
}

unsynn! {
    /// `#[...]`, kept as written.
    struct Attribute {
        _pound: Pound,
        _content: BracketGroup,
    }

    /// Anything a test function may carry between its attributes and `fn`.
    enum Qualifier {
        Async(KAsync),
        Unsafe(KUnsafe),
        Pub(Cons<KPub, Option<ParenthesisGroup>>),
    }

    /// `-> T`, up to the body.
    struct ReturnType {
        _arrow: RArrow,
        _ty: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct TestFn {
        attributes: Any<Attribute>,
        qualifiers: Any<Qualifier>,
        _fn: KFn,
        name: Ident,
        params: ParenthesisGroup,
        output: Option<ReturnType>,
        body: BraceGroup,
    }
}

fn compile_error(message: &str) -> proc_macro::TokenStream {
    quote::quote! { ::core::compile_error!(#message); }.into()
}

/// Marks a test that runs with the reqbind tracing subscriber installed,
/// inside a span named after the test.
///
/// ```ignore
/// #[reqbind_testhelpers::test]
/// fn binds_path_params() {
///     // tracing is set up, events are tagged with `binds_path_params`
/// }
/// ```
///
/// A different test attribute can be passed as an argument:
///
/// ```ignore
/// #[reqbind_testhelpers::test(tokio::test)]
/// async fn binds_in_a_runtime() {}
/// ```
#[proc_macro_attribute]
pub fn test(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let TestFn {
        attributes,
        qualifiers,
        _fn,
        name,
        params,
        output,
        body,
    } = match item.to_token_iter().parse::<TestFn>() {
        Ok(test_fn) => test_fn,
        Err(err) => return compile_error(&format!("expected a test function: {err:?}")),
    };

    if !params.0.stream().is_empty() {
        return compile_error(&format!("test `{name}` must not take arguments"));
    }

    let harness = if attr.is_empty() {
        quote::quote! { #[::core::prelude::rust_2024::test] }
    } else {
        let attr = TokenStream::from(attr);
        quote::quote! { #[#attr] }
    };

    let attributes = attributes.to_token_stream();
    let qualifiers = qualifiers.to_token_stream();
    let output = output.to_token_stream();
    let statements = body.0.stream();
    let test_name = name.to_string();

    quote::quote! {
        #harness
        #attributes
        #qualifiers fn #name() #output {
            let _span = ::reqbind_testhelpers::setup(#test_name);
            #statements
        }
    }
    .into()
}
