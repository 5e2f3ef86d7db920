use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, models, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::auth::authenticate,
		routes::auth::adduser,
		routes::packages::allow_access,
		routes::packages::allow_publish,
		routes::health::health
	),
	components(
		schemas(
			models::user::CredentialsRequest,
			models::user::AuthenticateResponse,
			models::package::PackageCheckRequest,
			models::package::DecisionResponse,
			authz::RegistryUser,
			authz::PackageSpec,
			routes::health::HealthResponse
		)
	),
	tags(
		(name = "Auth", description = "Registry login backed by GitLab credentials"),
		(name = "Packages", description = "Access and publish decisions"),
		(name = "Health", description = "Liveness and cache statistics")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	add_error_schema(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: &utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).try_it_out_enabled(true);

	let doc_json = Arc::new(serde_json::to_value(doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

/// Every failure response shares the `{error, message}` body.
fn add_error_schema(doc: &mut Value) {
	let addition = json!({
		"components": {
			"schemas": {
				"ErrorResponse": {
					"type": "object",
					"required": ["error", "message"],
					"properties": {
						"error": { "type": "string", "example": "access_denied" },
						"message": { "type": "string", "example": "access denied: ada may not read @frontend/ui-kit" }
					}
				}
			}
		}
	});
	merge_values(doc, &addition);
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{port}");

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}

fn merge_values(target: &mut Value, addition: &Value) {
	match (target, addition) {
		(Value::Object(dest), Value::Object(src)) => {
			for (key, value) in src {
				if let Some(existing) = dest.get_mut(key) {
					merge_values(existing, value);
				} else {
					dest.insert(key.clone(), value.clone());
				}
			}
		}
		(Value::Array(dest), Value::Array(src)) => {
			for item in src {
				if !dest.contains(item) {
					dest.push(item.clone());
				}
			}
		}
		_ => {}
	}
}
