use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Expr, ExprLit, ItemEnum, Lit};

/// One `Variant = "value"` or `Variant = 3` arm of the annotated enum
struct Arm {
    attrs: Vec<syn::Attribute>,
    name: Ident,
    value: Lit,
}

fn arms(item: &ItemEnum) -> syn::Result<Vec<Arm>> {
    item.variants
        .iter()
        .map(|variant| match &variant.discriminant {
            Some((_, Expr::Lit(ExprLit { lit, .. }))) => Ok(Arm {
                attrs: variant.attrs.clone(),
                name: variant.ident.clone(),
                value: lit.clone(),
            }),
            _ => Err(syn::Error::new(
                variant.span(),
                "every variant of a #[pdf_enum] needs a literal value",
            )),
        })
        .collect()
}

fn lookup(name: &Ident, arms: &[Arm], is_integer: bool) -> TokenStream2 {
    let names = arms.iter().map(|arm| &arm.name).collect::<Vec<_>>();
    let values = arms.iter().map(|arm| &arm.value).collect::<Vec<_>>();

    if is_integer {
        return quote! {
            impl #name {
                pub fn from_integer(i: i32) -> crate::PdfResult<Self> {
                    match i {
                        #(#values => Ok(Self::#names),)*
                        _ => Err(crate::PdfError::UnrecognizedVariant {
                            ty: stringify!(#name),
                            found: i.to_string(),
                        }),
                    }
                }
            }
        };
    }

    quote! {
        impl #name {
            pub fn from_str(s: &str) -> crate::PdfResult<Self> {
                match s {
                    #(#values => Ok(Self::#names),)*
                    _ => Err(crate::PdfError::UnrecognizedVariant {
                        ty: stringify!(#name),
                        found: s.to_owned(),
                    }),
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    #(Self::#names => #values,)*
                }
            }
        }
    }
}

pub fn pdf_enum_inner(attr: TokenStream, item: TokenStream) -> TokenStream {
    let object_type = parse_macro_input!(attr as Option<Ident>)
        .unwrap_or_else(|| Ident::new("Name", Span::call_site()));
    let item = parse_macro_input!(item as ItemEnum);

    let arms = match arms(&item) {
        Ok(arms) => arms,
        Err(err) => return err.to_compile_error().into(),
    };

    let is_integer = object_type == "Integer";

    let ItemEnum {
        attrs, vis, ident, ..
    } = &item;

    let variants = arms.iter().map(|Arm { attrs, name, value }| {
        if is_integer {
            quote!(#(#attrs)* #name = #value,)
        } else {
            quote!(#(#attrs)* #name,)
        }
    });

    let names = arms.iter().map(|arm| &arm.name);
    let values = arms.iter().map(|arm| &arm.value);
    let lookup = lookup(ident, &arms, is_integer);

    quote!(
        #(#attrs)*
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
        #vis enum #ident {
            #(#variants)*
        }

        impl crate::FromObj for #ident {
            fn from_obj(obj: crate::Object, resolver: &dyn crate::Resolve) -> crate::PdfResult<Self> {
                match resolver.resolve(obj)? {
                    #(crate::Object::#object_type(v) if v == #values => Ok(Self::#names),)*
                    crate::Object::#object_type(v) => Err(crate::PdfError::UnrecognizedVariant {
                        ty: stringify!(#ident),
                        found: format!("{:?}", v),
                    }),
                    found => Err(crate::PdfError::MismatchedObjectType {
                        expected: crate::ObjectType::#object_type,
                        found: found.object_type(),
                    }),
                }
            }
        }

        #lookup
    )
    .into()
}
