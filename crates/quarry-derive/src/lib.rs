//! Derive macros for quarry
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod entity;

/// Derive the `Entity` trait for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use quarry::Entity;
///
/// #[derive(Entity, Default)]
/// #[orm(table = "users")]
/// struct User {
///     id: i64,
///     #[orm(column = "email_address")]
///     email: Option<String>,
///     #[orm(tag = "column=nick")]
///     nickname: String,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Custom table name (empty falls back to the derived name)
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(tag = "k=v,...")]` - Raw struct tag, parsed by the registry at runtime
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
