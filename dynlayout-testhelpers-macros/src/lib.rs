//! `#[test]` for the dynlayout crates: the body may use `?` on any error,
//! and the harness in `dynlayout-testhelpers` is set up before it runs.

use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    // attributes, visibility and qualifiers in front of `fn`
    struct BeforeFn {
        items: Any<Cons<Except<KFn>, TokenTree>>,
    }

    // generics and parameters between the name and the body
    struct Signature {
        items: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct TestFn {
        before_fn: BeforeFn, _fn: KFn, name: Ident,
        signature: Signature, body: BraceGroup
    }
}

impl quote::ToTokens for BeforeFn {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for Signature {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

#[proc_macro_attribute]
pub fn test(
    _attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let mut tokens = item.to_token_iter();
    let TestFn {
        before_fn,
        _fn,
        name,
        signature,
        body,
    } = tokens
        .parse::<TestFn>()
        .expect("#[test] expects a function");
    let body = body.0.stream();

    quote::quote! {
        #[::core::prelude::rust_2024::test]
        #before_fn fn #name #signature -> ::dynlayout_testhelpers::eyre::Result<()> {
            ::dynlayout_testhelpers::setup();

            #body

            Ok(())
        }
    }
    .into()
}
