//! Proxy-generating macros for mapwire.
//!
//! This crate provides the `#[mapper]` attribute, which turns a plain trait
//! into a mapper interface:
//! - the trait gains `Send + Sync` supertraits
//! - a hidden proxy struct implements every required method by forwarding the
//!   call to a `mapwire::MapperProxy`
//! - `mapwire::MapperInterface` is implemented for `dyn Trait`
//!
//! Generated code references `::mapwire`, so the consuming crate must depend
//! on `mapwire` under that name.

use proc_macro::TokenStream;

mod mapper;

/// Attribute macro declaring a mapper interface.
///
/// Every method without a default body must take `&self`, use plain
/// identifiers for its parameters and return `Result<T, E>` where
/// `T: serde::de::DeserializeOwned` and `E: From<mapwire::MapperError>`.
/// Arguments are bound by parameter name and must implement `Serialize`.
///
/// # Example
///
/// ```ignore
/// use mapwire::{mapper, MapperError};
///
/// #[mapper]
/// pub trait UserMapper {
///     fn find_by_id(&self, id: i64) -> Result<Option<User>, MapperError>;
///     fn insert(&self, user: &User) -> Result<u64, MapperError>;
/// }
///
/// // Generated (abridged):
/// // pub trait UserMapper: Send + Sync { ... }
/// // pub struct __UserMapperProxy(mapwire::MapperProxy);
/// // impl UserMapper for __UserMapperProxy { ... }
/// // impl mapwire::MapperInterface for dyn UserMapper { ... }
/// ```
#[proc_macro_attribute]
pub fn mapper(attr: TokenStream, item: TokenStream) -> TokenStream {
    mapper::mapper_impl(attr, item)
}
