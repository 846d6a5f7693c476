use aide::{
	openapi::{SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json};

pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const USER: &str = "User";
	pub const POST: &str = "Post";
	pub const CHAT: &str = "Chat";
	pub const SERVICE: &str = "Service";
	pub const ADMIN: &str = "Admin";
}

fn tag(name: &str, description: &str) -> Tag {
	Tag {
		name: name.into(),
		description: Some(description.into()),
		..Default::default()
	}
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Konnect API")
		.summary("Social networking backend")
		.description(
			"Accounts, posts with likes, comments and shares, direct and group chat, \
			 service requests, and an admin panel for moderation.",
		)
		.tag(tag(tag::AUTH, "User sign up and log in"))
		.tag(tag(tag::USER, "Profiles, following and verification"))
		.tag(tag(tag::POST, "Posts and interactions"))
		.tag(tag(tag::CHAT, "Direct and group chat rooms"))
		.tag(tag(tag::SERVICE, "Ride and errand service requests"))
		.tag(tag(tag::ADMIN, "Administrator accounts and moderation"))
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("JWT".into()),
				description: Some("A token returned by a log in endpoint".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorBody>, _>(|res| {
			res.example(error::ErrorBody {
				status: 404,
				message: Some("Post not found".into()),
				error: None,
			})
		})
}
