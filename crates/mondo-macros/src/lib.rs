extern crate proc_macro;

mod expand;

use proc_macro::TokenStream;

/// Derives the `Entity` capability set for a plain record type.
///
/// Attributes:
/// - `#[key]` marks the identity field (an `ObjectId`; the all-zero value
///   means not yet persisted).
/// - `#[field("Name")]` overrides the storage key; without it the declared
///   field name is used verbatim.
/// - `#[odm("referenceOne(targetDocument:Role,cascade:persist)")]` declares a
///   relationship. The annotation string is parsed at registration.
#[proc_macro_derive(Entity, attributes(key, field, odm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    match expand::entity(input.into()) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
