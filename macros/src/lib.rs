mod model;
mod route;

use proc_macro::TokenStream;

/// Generates `<handler>_docs`, the aide transform documenting the handler.
///
/// The first line of the doc comment becomes the summary, the remaining lines the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Derives request input structs from a model: `CreateX` with the client-settable
/// fields verbatim, and `UpdateX` with every such field optional.
///
/// Fields with `#[serde(skip)]` or `#[serde(skip_deserializing)]` are never client-settable.
/// Pass `create` or `update` to only generate one of them; both are generated by default.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
