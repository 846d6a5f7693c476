use darling::{ast, FromMeta};
use proc_macro::TokenStream;
use quote::{format_ident, quote};

#[derive(FromMeta)]
struct RouteArgs {
	#[darling(multiple)]
	tag: Vec<syn::Expr>,
}

pub fn from_input(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(args) => args,
		Err(error) => return error.into_compile_error().into(),
	};

	let RouteArgs { tag: tags } = match RouteArgs::from_list(&args) {
		Ok(args) => args,
		Err(error) => return error.write_errors().into(),
	};

	let handler = syn::parse_macro_input!(input as syn::ItemFn);
	let lines = doc_lines(&handler.attrs);

	let Some((summary, description)) = split_doc(&lines) else {
		return syn::Error::new_spanned(&handler.sig.ident, "routes must have a doc comment")
			.into_compile_error()
			.into();
	};

	let docs = format_ident!("{}_docs", handler.sig.ident);
	let vis = &handler.vis;
	let description = description.map(|description| quote!(.description(#description)));

	quote! {
		#handler

		#vis fn #docs(
			op: aide::transform::TransformOperation,
		) -> aide::transform::TransformOperation {
			op.summary(#summary)
				#description
				#(.tag(#tags))*
		}
	}
	.into()
}

/// The trimmed lines of every `#[doc = "..."]` attribute, in order.
fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
	attrs
		.iter()
		.filter(|attr| attr.path().is_ident("doc"))
		.filter_map(|attr| match &attr.meta {
			syn::Meta::NameValue(syn::MetaNameValue {
				value: syn::Expr::Lit(syn::ExprLit {
					lit: syn::Lit::Str(text),
					..
				}),
				..
			}) => Some(text.value().trim().to_owned()),
			_ => None,
		})
		.collect()
}

/// The first paragraph becomes the summary and the rest, joined into one line, the description.
fn split_doc(lines: &[String]) -> Option<(String, Option<String>)> {
	let mut paragraphs = lines
		.split(|line| line.is_empty())
		.filter(|paragraph| !paragraph.is_empty())
		.map(|paragraph| paragraph.join(" "));

	let summary = paragraphs.next()?;
	let description = paragraphs.collect::<Vec<_>>().join("\n\n");

	Some((summary, (!description.is_empty()).then_some(description)))
}
