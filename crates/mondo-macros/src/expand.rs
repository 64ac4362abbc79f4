use proc_macro2::{Literal, TokenStream};
use quote::quote;

enum FieldKind {
    Identity,
    Scalar,
    ReferenceOne(syn::LitStr),
    ReferenceMany(syn::LitStr),
}

struct EntityField {
    ident: syn::Ident,
    index: usize,
    storage: Option<syn::LitStr>,
    kind: FieldKind,
}

pub(crate) fn entity(input: TokenStream) -> syn::Result<TokenStream> {
    let item: syn::DeriveInput = syn::parse2(input)?;

    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "generic entity types are not supported",
        ));
    }

    let fields = match &item.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &item.ident,
                    "entity fields must be named",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &item.ident,
                "Entity can only be derived for structs",
            ))
        }
    };

    let mut parsed = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        parsed.push(parse_field(field, index)?);
    }

    let identity: Vec<&EntityField> = parsed
        .iter()
        .filter(|field| matches!(field.kind, FieldKind::Identity))
        .collect();
    if identity.len() != 1 {
        return Err(syn::Error::new_spanned(
            &item.ident,
            "entity types must declare exactly one #[key] field",
        ));
    }
    let identity = identity[0];

    let ident = &item.ident;
    let id_ident = &identity.ident;
    let defs = parsed.iter().map(field_def);
    let get_arms = parsed.iter().map(get_arm);
    let set_arms = parsed.iter().map(set_arm);

    Ok(quote! {
        const _: () = {
            use mondo as _mondo;

            #[automatically_derived]
            impl _mondo::Entity for #ident {
                fn entity_fields() -> ::std::vec::Vec<_mondo::schema::FieldDef> {
                    ::std::vec![#(#defs),*]
                }

                fn entity_id(&self) -> _mondo::ObjectId {
                    self.#id_ident
                }

                fn set_entity_id(&mut self, id: _mondo::ObjectId) {
                    self.#id_ident = id;
                }

                fn field(&self, index: usize) -> _mondo::FieldValue {
                    match index {
                        #(#get_arms)*
                        _ => ::core::panic!(
                            "field index {} out of range for `{}`",
                            index,
                            ::core::stringify!(#ident),
                        ),
                    }
                }

                fn set_field(
                    &mut self,
                    index: usize,
                    value: _mondo::FieldValue,
                ) -> _mondo::Result<()> {
                    match index {
                        #(#set_arms)*
                        _ => ::core::panic!(
                            "field index {} out of range for `{}`",
                            index,
                            ::core::stringify!(#ident),
                        ),
                    }
                    ::core::result::Result::Ok(())
                }
            }
        };
    })
}

fn parse_field(field: &syn::Field, index: usize) -> syn::Result<EntityField> {
    let Some(ident) = field.ident.clone() else {
        return Err(syn::Error::new_spanned(field, "entity fields must be named"));
    };

    let mut key = false;
    let mut storage = None;
    let mut annotation: Option<syn::LitStr> = None;

    for attr in &field.attrs {
        if attr.path().is_ident("key") {
            if key {
                return Err(syn::Error::new_spanned(attr, "duplicate #[key] attribute"));
            }
            key = true;
        } else if attr.path().is_ident("field") {
            if storage.is_some() {
                return Err(syn::Error::new_spanned(attr, "duplicate #[field] attribute"));
            }
            storage = Some(attr.parse_args::<syn::LitStr>()?);
        } else if attr.path().is_ident("odm") {
            if annotation.is_some() {
                return Err(syn::Error::new_spanned(attr, "duplicate #[odm] attribute"));
            }
            annotation = Some(attr.parse_args::<syn::LitStr>()?);
        }
    }

    let kind = match (key, annotation) {
        (true, Some(lit)) => {
            return Err(syn::Error::new(
                lit.span(),
                "#[key] fields cannot carry a relationship annotation",
            ))
        }
        (true, None) => FieldKind::Identity,
        (false, Some(lit)) => {
            // Only the kind prefix is inspected here; the full annotation
            // grammar is parsed at registration.
            let text = lit.value();
            let head = text.trim_start();
            if head.starts_with("referenceMany") {
                FieldKind::ReferenceMany(lit)
            } else if head.starts_with("referenceOne") {
                FieldKind::ReferenceOne(lit)
            } else {
                return Err(syn::Error::new(
                    lit.span(),
                    "relationship annotations must start with `referenceOne` or `referenceMany`",
                ));
            }
        }
        (false, None) => FieldKind::Scalar,
    };

    Ok(EntityField {
        ident,
        index,
        storage,
        kind,
    })
}

fn field_def(field: &EntityField) -> TokenStream {
    let name = field.ident.to_string();
    let storage = match &field.storage {
        Some(lit) => quote!(::core::option::Option::Some(#lit)),
        None => quote!(::core::option::Option::None),
    };
    match &field.kind {
        FieldKind::Identity => quote!(_mondo::schema::FieldDef::identity(#name, #storage)),
        FieldKind::Scalar => quote!(_mondo::schema::FieldDef::scalar(#name, #storage)),
        FieldKind::ReferenceOne(lit) | FieldKind::ReferenceMany(lit) => {
            quote!(_mondo::schema::FieldDef::relation(#name, #storage, #lit))
        }
    }
}

fn get_arm(field: &EntityField) -> TokenStream {
    let index = Literal::usize_unsuffixed(field.index);
    let ident = &field.ident;
    match &field.kind {
        FieldKind::Identity => quote! {
            #index => _mondo::FieldValue::Scalar(_mondo::Value::ObjectId(self.#ident)),
        },
        FieldKind::Scalar => quote! {
            #index => _mondo::FieldValue::Scalar(
                _mondo::codegen_support::ToValue::to_value(&self.#ident),
            ),
        },
        FieldKind::ReferenceOne(_) => quote! {
            #index => _mondo::FieldValue::One(
                _mondo::codegen_support::untyped_one(&self.#ident),
            ),
        },
        FieldKind::ReferenceMany(_) => quote! {
            #index => _mondo::FieldValue::Many(
                _mondo::codegen_support::untyped_many(&self.#ident),
            ),
        },
    }
}

fn set_arm(field: &EntityField) -> TokenStream {
    let index = Literal::usize_unsuffixed(field.index);
    let ident = &field.ident;
    match &field.kind {
        FieldKind::Identity | FieldKind::Scalar => quote! {
            #index => {
                self.#ident =
                    _mondo::codegen_support::FromValue::from_value(value.into_scalar()?)?;
            }
        },
        FieldKind::ReferenceOne(_) => quote! {
            #index => {
                self.#ident = _mondo::codegen_support::typed_one(value)?;
            }
        },
        FieldKind::ReferenceMany(_) => quote! {
            #index => {
                self.#ident = _mondo::codegen_support::typed_many(value)?;
            }
        },
    }
}
