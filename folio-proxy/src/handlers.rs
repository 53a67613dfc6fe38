use actix_web::http::{Method, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use folio::auth::{ADMIN_TOKEN_HEADER, CONSOLE_TOKEN_HEADER};
use folio::persistence::{BUILDER_LOAD_ROUTE, BUILDER_SAVE_ROUTE, CONTENT_ROUTE, DEPLOY_ROUTE};
use serde_json::{json, Map, Value};

use crate::config::ProxyConfig;
use crate::AppState;

/// Characters of a failing build hook response echoed back.
const HOOK_RESPONSE_LIMIT: usize = 500;

/// Configure all proxy routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(CONTENT_ROUTE)
            .route(web::post().to(save_content))
            .route(web::method(Method::OPTIONS).to(content_preflight))
            .default_service(web::to(method_not_allowed)),
    )
    .service(web::resource(BUILDER_LOAD_ROUTE).route(web::get().to(builder_load)))
    .service(web::resource(BUILDER_SAVE_ROUTE).route(web::post().to(builder_save)))
    .service(
        web::resource(DEPLOY_ROUTE)
            .route(web::post().to(deploy))
            .route(web::method(Method::OPTIONS).to(deploy_preflight))
            .default_service(web::to(method_not_allowed)),
    );
}

// ── Helpers ─────────────────────────────────────────────────────────

fn json_response(status: StatusCode, payload: Value) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(("Cache-Control", "no-store"))
        .json(payload)
}

fn text_response(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/plain; charset=utf-8")
        .insert_header(("Cache-Control", "no-store"))
        .body(body)
}

fn forbidden(detail: &str) -> HttpResponse {
    json_response(
        StatusCode::FORBIDDEN,
        json!({ "ok": false, "error": "Forbidden", "detail": detail }),
    )
}

fn bad_request(error: &str) -> HttpResponse {
    json_response(StatusCode::BAD_REQUEST, json!({ "ok": false, "error": error }))
}

fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// With an allow-list configured, either `Origin` must match exactly or
/// `Referer` must start with it.
fn origin_allowed(req: &HttpRequest, config: &ProxyConfig) -> bool {
    let Some(allowed) = config.allowed_origin.as_deref() else {
        return true;
    };
    header(req, "origin") == Some(allowed)
        || header(req, "referer").is_some_and(|r| r.starts_with(allowed))
}

fn admin_allowed(req: &HttpRequest, config: &ProxyConfig) -> bool {
    match config.admin_token.as_deref() {
        Some(required) => header(req, ADMIN_TOKEN_HEADER) == Some(required),
        None => true,
    }
}

/// Pretty JSON with sorted keys and a trailing newline.
fn stable_json(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_default();
    text.push('\n');
    text
}

/// True when `candidate` serializes to `current_text` once its `updatedAt`
/// is taken from the stored file.
fn is_unchanged(candidate: &Map<String, Value>, current_text: &str) -> bool {
    let Ok(Value::Object(current)) = serde_json::from_str::<Value>(current_text) else {
        return false;
    };
    let mut probe = candidate.clone();
    match current.get("updatedAt") {
        Some(ts) => {
            probe.insert("updatedAt".to_string(), ts.clone());
        }
        None => {
            probe.remove("updatedAt");
        }
    }
    stable_json(&Value::Object(probe)) == current_text
}

fn preflight(req: &HttpRequest, config: &ProxyConfig, allow_headers: &str) -> HttpResponse {
    let allow_origin = config
        .allowed_origin
        .clone()
        .or_else(|| header(req, "origin").map(str::to_string))
        .unwrap_or_else(|| "*".to_string());

    HttpResponse::NoContent()
        .insert_header(("Access-Control-Allow-Origin", allow_origin))
        .insert_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .insert_header(("Access-Control-Allow-Headers", allow_headers.to_string()))
        .insert_header(("Access-Control-Max-Age", "86400"))
        .insert_header(("Cache-Control", "no-store"))
        .finish()
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header(("Allow", "POST, OPTIONS"))
        .insert_header(("Cache-Control", "no-store"))
        .json(json!({ "ok": false, "error": "Method Not Allowed" }))
}

// ── Content ─────────────────────────────────────────────────────────

async fn content_preflight(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let allow_headers = format!("Content-Type, {CONSOLE_TOKEN_HEADER}");
    preflight(&req, &state.config, &allow_headers)
}

async fn save_content(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    let config = &state.config;

    if config.github_token.is_none() {
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "ok": false,
                "error": "Missing GITHUB_TOKEN env var",
                "hint": "Set GITHUB_TOKEN to a token with Contents read/write on the repository.",
            }),
        );
    }

    if !origin_allowed(&req, config) {
        log::warn!("Rejected /content from origin {:?}", header(&req, "origin"));
        return forbidden("Origin/Referer not allowed");
    }

    if let Some(secret) = config.console_token.as_deref() {
        if header(&req, CONSOLE_TOKEN_HEADER) != Some(secret) {
            log::warn!("Rejected /content: missing or invalid console token");
            return forbidden("Missing/invalid console token");
        }
    }

    if body.is_empty() {
        return bad_request("Missing request body");
    }
    let Ok(parsed) = serde_json::from_slice::<Value>(&body) else {
        return bad_request("Invalid JSON body");
    };
    let Some(mut content) = parsed.get("content").and_then(Value::as_object).cloned() else {
        return bad_request("Body must be { content: {...} }");
    };
    if !content.get("pages").is_some_and(Value::is_object) {
        return bad_request("content.pages must be an object");
    }
    if !content.get("schemaVersion").is_some_and(Value::is_number) {
        content.insert("schemaVersion".to_string(), json!(1));
    }

    if config.repo_parts().is_none() {
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "ok": false, "error": "Invalid GITHUB_REPO format. Expected owner/repo." }),
        );
    }
    let Some(contents) = state.contents.as_deref() else {
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "ok": false, "error": "GitHub client not configured" }),
        );
    };

    let path = config.content_path.as_str();
    let current = match contents.get_file(path).await {
        Ok(file) => file,
        Err(e) => {
            log::warn!("GitHub read of {path} failed: {e}");
            return json_response(
                StatusCode::BAD_GATEWAY,
                json!({
                    "ok": false,
                    "error": "GitHub read failed",
                    "status": e.status(),
                    "detail": e.detail(),
                }),
            );
        }
    };

    if let Some(file) = &current {
        if is_unchanged(&content, &file.text) {
            log::info!("{path} unchanged, skipping commit");
            return json_response(
                StatusCode::OK,
                json!({ "ok": true, "changed": false, "fileSha": file.sha }),
            );
        }
    }

    content.insert(
        "updatedAt".to_string(),
        json!(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
    );
    let text = stable_json(&Value::Object(content));
    let message = parsed
        .get("commitMessage")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("chore(content): update {path} via folio console"));

    let sha = current.as_ref().map(|f| f.sha.as_str());
    match contents.put_file(path, &text, &message, sha).await {
        Ok(result) => {
            log::info!(
                "Committed {path}: {}",
                result.commit_sha.as_deref().unwrap_or("?")
            );
            json_response(
                StatusCode::OK,
                json!({
                    "ok": true,
                    "changed": true,
                    "commitSha": result.commit_sha,
                    "fileSha": result.file_sha,
                }),
            )
        }
        Err(e) => {
            log::warn!("GitHub write of {path} failed: {e}");
            json_response(
                StatusCode::BAD_GATEWAY,
                json!({
                    "ok": false,
                    "error": "GitHub write failed",
                    "status": e.status(),
                    "detail": e.detail(),
                }),
            )
        }
    }
}

// ── Builder state ───────────────────────────────────────────────────

fn missing_github_env() -> HttpResponse {
    text_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Missing env vars (GITHUB_REPO/GITHUB_TOKEN)".to_string(),
    )
}

async fn builder_load(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let config = &state.config;
    if !admin_allowed(&req, config) {
        log::warn!("Rejected {BUILDER_LOAD_ROUTE}: bad admin token");
        return text_response(StatusCode::UNAUTHORIZED, "Unauthorized".to_string());
    }
    let Some(contents) = state.contents.as_deref() else {
        return missing_github_env();
    };
    if config.github_token.is_none() || config.repo_parts().is_none() {
        return missing_github_env();
    }

    match contents.get_file(&config.builder_state_path).await {
        Ok(Some(file)) => HttpResponse::Ok()
            .content_type("application/json")
            .insert_header(("Cache-Control", "no-store"))
            .body(file.text),
        Ok(None) => text_response(
            StatusCode::NOT_FOUND,
            "GitHub fetch failed: Not Found".to_string(),
        ),
        Err(e) => text_response(
            upstream_status(e.status()),
            format!("GitHub fetch failed: {}", e.detail()),
        ),
    }
}

async fn builder_save(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    let config = &state.config;
    if !admin_allowed(&req, config) {
        log::warn!("Rejected {BUILDER_SAVE_ROUTE}: bad admin token");
        return text_response(StatusCode::UNAUTHORIZED, "Unauthorized".to_string());
    }
    let Some(contents) = state.contents.as_deref() else {
        return missing_github_env();
    };
    if config.github_token.is_none() || config.repo_parts().is_none() {
        return missing_github_env();
    }

    let payload = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(v) => v,
            Err(_) => {
                return text_response(
                    StatusCode::BAD_REQUEST,
                    "Bad Request: invalid JSON".to_string(),
                )
            }
        }
    };
    let Some(builder_state) = payload.get("state").filter(|s| s.is_object()) else {
        return text_response(
            StatusCode::BAD_REQUEST,
            "Bad Request: missing state".to_string(),
        );
    };

    let path = config.builder_state_path.as_str();
    // A failed read just means the file gets created.
    let sha = contents.get_file(path).await.ok().flatten().map(|f| f.sha);
    let text = serde_json::to_string_pretty(builder_state).unwrap_or_default();
    let message = format!("builder: update {path}");

    match contents
        .put_file(path, &text, &message, sha.as_deref())
        .await
    {
        Ok(result) => {
            log::info!(
                "Committed {path}: {}",
                result.commit_sha.as_deref().unwrap_or("?")
            );
            json_response(StatusCode::OK, json!({ "ok": true }))
        }
        Err(e) => {
            log::warn!("GitHub write of {path} failed: {e}");
            text_response(
                upstream_status(e.status()),
                format!("GitHub put failed: {}", e.detail()),
            )
        }
    }
}

// ── Deploy ──────────────────────────────────────────────────────────

async fn deploy_preflight(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    preflight(&req, &state.config, "Content-Type")
}

async fn deploy(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let Some(hook) = state.hook.as_deref() else {
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "ok": false,
                "error": "Missing NETLIFY_BUILD_HOOK_URL env var",
                "hint": "Set NETLIFY_BUILD_HOOK_URL to the site's build hook URL.",
            }),
        );
    };

    if !origin_allowed(&req, &state.config) {
        log::warn!("Rejected /deploy from origin {:?}", header(&req, "origin"));
        return forbidden("Origin/Referer not allowed");
    }

    match hook.trigger().await {
        Ok(()) => {
            log::info!("Build hook triggered");
            json_response(StatusCode::OK, json!({ "ok": true }))
        }
        Err(failure) => {
            log::warn!("Build hook failed: {:?} {}", failure.status, failure.body);
            let response: String = failure.body.chars().take(HOOK_RESPONSE_LIMIT).collect();
            json_response(
                StatusCode::BAD_GATEWAY,
                json!({
                    "ok": false,
                    "error": "Build hook request failed",
                    "status": failure.status,
                    "response": response,
                }),
            )
        }
    }
}
