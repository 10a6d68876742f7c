//! Browser UI server.
//!
//! A single-threaded tiny_http loop owns the [`Controller`]. The page shell
//! in `index.html` posts small JSON actions and re-renders from
//! `/api/state`, whose HTML fragments are produced server-side.

use crate::api::Backend;
use crate::app::{Controller, SearchOutcome, View};
use crate::cli::WebArgs;
use crate::config::Config;
use crate::dashboard::validate_lookback;
use crate::expression::datetime::format_picker;
use crate::expression::{Comparator, DateTimeRange, LineId, LineInput};
use crate::highlight::HighlightOutcome;
use crate::render::tags::TagButton;
use crate::render::Message;
use crate::signal::setup_shutdown_handlers;
use chrono::{Local, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, info, warn};

const INDEX_HTML: &str = include_str!("index.html");
const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;
const TICK_INTERVAL_MS: u64 = 250;

#[derive(Serialize)]
struct BasicResponse {
    ok: bool,
    message: Option<String>,
}

#[derive(Serialize)]
struct StateView<'a> {
    view: View,
    lines: Vec<LineView<'a>>,
    fields: &'a [String],
    comparators: Vec<&'static str>,
    range: RangeView,
    messages: &'a [Message],
    messages_html: String,
    tags: &'a [TagButton],
    tags_html: String,
    table: TableView<'a>,
    lookback_hours: u32,
}

#[derive(Serialize)]
struct LineView<'a> {
    id: LineId,
    field: &'a str,
    comparator: &'static str,
    input: &'a LineInput,
}

#[derive(Serialize)]
struct RangeView {
    start: String,
    end: String,
}

#[derive(Serialize)]
struct TableView<'a> {
    html: String,
    loading: bool,
    page: usize,
    page_count: usize,
    rows: usize,
    columns: Vec<ColumnView<'a>>,
}

#[derive(Serialize)]
struct ColumnView<'a> {
    name: &'a str,
    visible: bool,
}

#[derive(Serialize)]
struct DashboardView {
    lookback_hours: u32,
    html: String,
}

#[derive(Serialize)]
struct LineAdded {
    ok: bool,
    id: LineId,
}

#[derive(Serialize)]
struct ComparatorChanged {
    ok: bool,
    comparator: &'static str,
}

#[derive(Serialize)]
struct Toggled {
    ok: bool,
    active: bool,
}

#[derive(Serialize)]
struct SearchDone {
    ok: bool,
    outcome: &'static str,
    rows: usize,
    total_rows: u64,
}

#[derive(Serialize)]
struct Highlighted {
    ok: bool,
    outcome: &'static str,
    color: Option<&'static str>,
    matches: usize,
    html: String,
}

#[derive(Deserialize)]
struct LineRequest {
    id: u64,
}

#[derive(Deserialize)]
struct UpdateLineRequest {
    id: u64,
    field: Option<String>,
    comparator: Option<String>,
    value: Option<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
}

#[derive(Deserialize)]
struct RowRequest {
    row: usize,
}

#[derive(Deserialize)]
struct TagRequest {
    tag: String,
}

#[derive(Deserialize)]
struct ColumnRequest {
    column: String,
    visible: bool,
}

#[derive(Deserialize)]
struct PageRequest {
    page: usize,
}

#[derive(Deserialize)]
struct HighlightRequest {
    row: usize,
    token: String,
}

#[derive(Deserialize)]
struct DrillDownRequest {
    item: String,
    entry: String,
}

#[derive(Deserialize)]
struct ViewRequest {
    view: View,
}

#[derive(Deserialize)]
struct LookbackRequest {
    hours: u32,
}

#[derive(Deserialize)]
struct DismissRequest {
    id: u64,
}

#[derive(Debug)]
enum BodyReadError {
    TooLarge,
    Invalid(String),
}

impl std::fmt::Display for BodyReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BodyReadError::TooLarge => write!(f, "request body too large"),
            BodyReadError::Invalid(msg) => f.write_str(msg),
        }
    }
}

/// Response produced by [`route`], sent by [`handle_request`].
#[derive(Debug)]
struct Reply {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            body: to_json_string(value),
        }
    }

    fn ok() -> Self {
        Self::json(
            200,
            &BasicResponse {
                ok: true,
                message: None,
            },
        )
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(
            status,
            &BasicResponse {
                ok: false,
                message: Some(message.into()),
            },
        )
    }

    fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.to_string(),
        }
    }

    fn plain(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
        }
    }
}

pub fn run(args: WebArgs, backend: Arc<dyn Backend>, config: Config) -> Result<(), i32> {
    let mut controller = Controller::new(backend, config);
    // Failures land in the message panel; the page still starts.
    controller.load_columns();
    controller.load_tags();
    controller.add_line();

    let shared = Arc::new(Mutex::new(controller));

    let bind_addr = format!("{}:{}", args.host, args.port);
    let server = match Server::http(&bind_addr) {
        Ok(server) => server,
        Err(err) => {
            eprintln!("error: Failed to bind web server on {}: {}", bind_addr, err);
            return Err(1);
        }
    };

    let open_host = if args.host == "0.0.0.0" {
        "127.0.0.1"
    } else {
        &args.host
    };
    let open_url = format!("http://{}:{}/", open_host, args.port);

    info!(addr = %bind_addr, "Web UI listening");
    println!("Tamandua Web UI started at {}", open_url);
    println!("Press Ctrl+C to stop.");

    let shutdown = match setup_shutdown_handlers() {
        Ok(flag) => flag,
        Err(err) => {
            eprintln!("warning: Failed to set signal handlers: {}", err);
            return Err(1);
        }
    };

    while !shutdown.is_raised() {
        match server.recv_timeout(Duration::from_millis(TICK_INTERVAL_MS)) {
            Ok(Some(request)) => handle_request(request, &shared),
            Ok(None) => tick(&mut lock_state(&shared), Local::now().naive_local()),
            Err(err) => {
                eprintln!("error: Web server receive error: {}", err);
                return Err(1);
            }
        }
    }

    info!("Web UI stopped");
    Ok(())
}

/// Keep the dashboard current while it is on screen.
fn tick(controller: &mut Controller, now: NaiveDateTime) {
    if controller.view() == View::Dashboard && controller.refresh_dashboard_if_stale(now) {
        debug!("Dashboard refreshed on tick");
    }
}

fn handle_request(request: tiny_http::Request, shared: &Arc<Mutex<Controller>>) {
    let mut request = request;
    let url = request.url().to_string();
    let (path, query) = split_url_and_query(&url);
    let method = request.method().clone();
    debug!(%method, path, "Request");

    let body = if method == Method::Post {
        match read_body(&mut request) {
            Ok(body) => body,
            Err(BodyReadError::TooLarge) => {
                respond(request, Reply::error(413, "Request body too large"));
                return;
            }
            Err(BodyReadError::Invalid(err)) => {
                respond(
                    request,
                    Reply::error(400, format!("Invalid request body: {}", err)),
                );
                return;
            }
        }
    } else {
        String::new()
    };

    let reply = {
        let mut controller = lock_state(shared);
        route(
            &mut controller,
            &method,
            path,
            &query,
            &body,
            Local::now().naive_local(),
        )
    };
    if reply.status >= 400 {
        warn!(%method, path, status = reply.status, "Request failed");
    }
    respond(request, reply);
}

fn route(
    controller: &mut Controller,
    method: &Method,
    path: &str,
    query: &HashMap<String, String>,
    body: &str,
    now: NaiveDateTime,
) -> Reply {
    let result = match (method, path) {
        (&Method::Get, "/") => Ok(Reply::html(INDEX_HTML)),
        (&Method::Get, "/favicon.ico") => Ok(Reply::plain(204, "")),
        (&Method::Get, "/api/state") => Ok(Reply::json(200, &state_view(controller))),
        (&Method::Get, "/api/dashboard") => dashboard(controller, query, now),
        (&Method::Post, _) => route_post(controller, path, body, now),
        _ => Err(Reply::error(404, "Not found")),
    };
    result.unwrap_or_else(|reply| reply)
}

fn route_post(
    controller: &mut Controller,
    path: &str,
    body: &str,
    now: NaiveDateTime,
) -> Result<Reply, Reply> {
    match path {
        "/api/lines/add" => match controller.add_line() {
            Some(id) => Ok(Reply::json(200, &LineAdded { ok: true, id })),
            None => Err(Reply::error(
                409,
                "Fill in or remove the empty line before adding another.",
            )),
        },
        "/api/lines/remove" => {
            let payload: LineRequest = parse_payload(body)?;
            found(controller.remove_line(payload.id.into()), "Line not found")
        }
        "/api/lines/cycle" => {
            let payload: LineRequest = parse_payload(body)?;
            let comparator = controller
                .cycle_comparator(payload.id.into())
                .ok_or_else(|| Reply::error(404, "Line not found"))?;
            Ok(Reply::json(
                200,
                &ComparatorChanged {
                    ok: true,
                    comparator: comparator.label(),
                },
            ))
        }
        "/api/lines/update" => {
            let payload: UpdateLineRequest = parse_payload(body)?;
            update_line(controller, payload)
        }
        "/api/search" => {
            let payload: SearchRequest = parse_payload(body)?;
            let range = DateTimeRange::from_picker(&payload.start, &payload.end)
                .map_err(|err| Reply::error(400, format!("Invalid date: {}", err)))?;
            Ok(search_reply(controller.search(range)))
        }
        "/api/rows/toggle" => {
            let payload: RowRequest = parse_payload(body)?;
            toggled(controller.table_mut().toggle_row(payload.row), "Row not found")
        }
        "/api/rows/empty" => {
            let payload: RowRequest = parse_payload(body)?;
            toggled(
                controller.table_mut().toggle_empty_fields(payload.row),
                "Row not found",
            )
        }
        "/api/tags/toggle" => {
            let payload: TagRequest = parse_payload(body)?;
            toggled(controller.toggle_tag(&payload.tag), "Unknown tag")
        }
        "/api/columns/visible" => {
            let payload: ColumnRequest = parse_payload(body)?;
            found(
                controller
                    .table_mut()
                    .set_column_visible(&payload.column, payload.visible),
                "Unknown column",
            )
        }
        "/api/page" => {
            let payload: PageRequest = parse_payload(body)?;
            controller.table_mut().set_page(payload.page);
            Ok(Reply::ok())
        }
        "/api/highlight" => {
            let payload: HighlightRequest = parse_payload(body)?;
            let outcome = controller
                .highlight(payload.row, &payload.token)
                .ok_or_else(|| Reply::error(404, "Row not found"))?;
            let html = controller
                .table()
                .row(payload.row)
                .map(|r| r.log.markup().to_string())
                .unwrap_or_default();
            Ok(Reply::json(200, &highlight_view(outcome, html)))
        }
        "/api/drilldown" => {
            let payload: DrillDownRequest = parse_payload(body)?;
            let outcome = controller
                .drill_down(&payload.item, &payload.entry, now)
                .ok_or_else(|| Reply::error(404, "Unknown dashboard entry"))?;
            Ok(search_reply(outcome))
        }
        "/api/view" => {
            let payload: ViewRequest = parse_payload(body)?;
            controller.set_view(payload.view);
            if payload.view == View::Dashboard {
                controller.refresh_dashboard_if_stale(now);
            }
            Ok(Reply::ok())
        }
        "/api/dashboard/lookback" => {
            let payload: LookbackRequest = parse_payload(body)?;
            let hours = validate_lookback(payload.hours).map_err(|e| Reply::error(400, e))?;
            controller.set_lookback(hours, now);
            Ok(Reply::json(200, &dashboard_view(controller)))
        }
        "/api/messages/dismiss" => {
            let payload: DismissRequest = parse_payload(body)?;
            found(
                controller.messages_mut().dismiss(payload.id),
                "Message not found",
            )
        }
        _ => Err(Reply::error(404, "Not found")),
    }
}

fn update_line(controller: &mut Controller, payload: UpdateLineRequest) -> Result<Reply, Reply> {
    let id = LineId::from(payload.id);
    if controller.builder().line(id).is_none() {
        return Err(Reply::error(404, "Line not found"));
    }

    if let Some(label) = payload.comparator {
        let comparator = Comparator::from_label(&label)
            .ok_or_else(|| Reply::error(400, format!("Unknown comparator '{}'", label)))?;
        controller.set_comparator(id, comparator);
    }
    if let Some(field) = payload.field {
        controller.set_field(id, &field);
    }
    if let Some(value) = payload.value {
        controller.set_value(id, &value);
    }
    Ok(Reply::ok())
}

fn dashboard(
    controller: &mut Controller,
    query: &HashMap<String, String>,
    now: NaiveDateTime,
) -> Result<Reply, Reply> {
    if let Some(raw) = query.get("hours") {
        let hours = raw
            .parse::<u32>()
            .map_err(|_| Reply::error(400, format!("Invalid 'hours' value '{}'", raw)))
            .and_then(|h| validate_lookback(h).map_err(|e| Reply::error(400, e)))?;
        controller.set_lookback(hours, now);
    }
    controller.refresh_dashboard_if_stale(now);
    Ok(Reply::json(200, &dashboard_view(controller)))
}

fn state_view(controller: &Controller) -> StateView<'_> {
    let table = controller.table();
    let range = controller.range();
    StateView {
        view: controller.view(),
        lines: controller
            .lines()
            .iter()
            .map(|line| LineView {
                id: line.id,
                field: &line.field,
                comparator: line.comparator.label(),
                input: &line.input,
            })
            .collect(),
        fields: controller.columns(),
        comparators: Comparator::CYCLE.iter().map(|c| c.label()).collect(),
        range: RangeView {
            start: range.start.map(format_picker).unwrap_or_default(),
            end: range.end.map(format_picker).unwrap_or_default(),
        },
        messages: controller.messages().messages(),
        messages_html: controller.messages().render(),
        tags: controller.tags().buttons(),
        tags_html: controller.tags().render(),
        table: TableView {
            html: table.render(),
            loading: table.is_loading(),
            page: table.page(),
            page_count: table.page_count(),
            rows: table.filtered_rows().len(),
            columns: table
                .ordered_columns()
                .into_iter()
                .map(|name| ColumnView {
                    name,
                    visible: table.is_column_visible(name),
                })
                .collect(),
        },
        lookback_hours: controller.dashboard().lookback_hours(),
    }
}

fn dashboard_view(controller: &Controller) -> DashboardView {
    DashboardView {
        lookback_hours: controller.dashboard().lookback_hours(),
        html: controller.dashboard_html(),
    }
}

fn search_reply(outcome: SearchOutcome) -> Reply {
    let (name, rows, total_rows) = match outcome {
        SearchOutcome::Rejected(_) => ("rejected", 0, 0),
        SearchOutcome::Failed(_) => ("failed", 0, 0),
        SearchOutcome::NoResults => ("empty", 0, 0),
        SearchOutcome::Loaded {
            rows, total_rows, ..
        } => ("loaded", rows, total_rows),
    };
    Reply::json(
        200,
        &SearchDone {
            ok: name == "loaded" || name == "empty",
            outcome: name,
            rows,
            total_rows,
        },
    )
}

fn highlight_view(outcome: HighlightOutcome, html: String) -> Highlighted {
    let (name, color, matches) = match outcome {
        HighlightOutcome::Highlighted { color, matches } => ("highlighted", Some(color), matches),
        HighlightOutcome::Cleared => ("cleared", None, 0),
        HighlightOutcome::Ignored => ("ignored", None, 0),
    };
    Highlighted {
        ok: true,
        outcome: name,
        color,
        matches,
        html,
    }
}

fn found(ok: bool, missing: &str) -> Result<Reply, Reply> {
    if ok {
        Ok(Reply::ok())
    } else {
        Err(Reply::error(404, missing))
    }
}

fn toggled(active: Option<bool>, missing: &str) -> Result<Reply, Reply> {
    let active = active.ok_or_else(|| Reply::error(404, missing))?;
    Ok(Reply::json(200, &Toggled { ok: true, active }))
}

fn parse_payload<T: DeserializeOwned>(body: &str) -> Result<T, Reply> {
    serde_json::from_str(body)
        .map_err(|err| Reply::error(400, format!("Invalid JSON payload: {}", err)))
}

fn lock_state<'a>(shared: &'a Arc<Mutex<Controller>>) -> std::sync::MutexGuard<'a, Controller> {
    match shared.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn split_url_and_query(url: &str) -> (&str, HashMap<String, String>) {
    if let Some(idx) = url.find('?') {
        (&url[..idx], parse_query_params(&url[idx + 1..]))
    } else {
        (url, HashMap::new())
    }
}

fn parse_query_params(query: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        if let Some((k, v)) = pair.split_once('=') {
            out.insert(k.to_string(), v.to_string());
        } else {
            out.insert(pair.to_string(), String::new());
        }
    }
    out
}

fn read_body(request: &mut tiny_http::Request) -> Result<String, BodyReadError> {
    if let Some(content_length) = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Length"))
        .and_then(|h| h.value.as_str().parse::<u64>().ok())
    {
        if content_length > MAX_REQUEST_BODY_SIZE as u64 {
            return Err(BodyReadError::TooLarge);
        }
    }

    let mut body = String::new();
    let mut reader = request.as_reader().take((MAX_REQUEST_BODY_SIZE as u64) + 1);
    reader
        .read_to_string(&mut body)
        .map_err(|err| BodyReadError::Invalid(err.to_string()))?;

    if body.len() > MAX_REQUEST_BODY_SIZE {
        return Err(BodyReadError::TooLarge);
    }

    Ok(body)
}

fn respond(request: tiny_http::Request, reply: Reply) {
    let response = make_response(reply.status, reply.content_type, reply.body);
    let _ = request.respond(response);
}

fn make_response(
    status: u16,
    content_type: &str,
    body: String,
) -> Response<std::io::Cursor<Vec<u8>>> {
    let response = Response::from_string(body).with_status_code(StatusCode(status));
    match Header::from_bytes("Content-Type", content_type) {
        Ok(header) => response.with_header(header),
        Err(_) => response,
    }
}

fn to_json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AdvCountResponse, CountItem};
    use crate::expression::datetime::MAX_LOOKBACK_HOURS;
    use crate::test_utils::MockBackend;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn controller(backend: MockBackend) -> Controller {
        let mut controller = Controller::new(Arc::new(backend), Config::default());
        controller.load_columns();
        controller.load_tags();
        controller
    }

    fn post(controller: &mut Controller, path: &str, body: Value) -> (u16, Value) {
        let reply = route(
            controller,
            &Method::Post,
            path,
            &HashMap::new(),
            &body.to_string(),
            now(),
        );
        (reply.status, serde_json::from_str(&reply.body).unwrap())
    }

    fn get(controller: &mut Controller, url: &str) -> (u16, Value) {
        let (path, query) = split_url_and_query(url);
        let reply = route(controller, &Method::Get, path, &query, "", now());
        (reply.status, serde_json::from_str(&reply.body).unwrap())
    }

    fn loaded_backend() -> MockBackend {
        MockBackend::new().with_rows(
            vec![
                json!({"sender": "a@x.com", "tags": ["spam"], "loglines": ["queued a@x.com"]}),
                json!({"sender": "b@x.com", "tags": ["incoming"], "loglines": ["sent"]}),
            ],
            2,
        )
    }

    #[test]
    fn test_index_and_unknown_routes() {
        let mut c = controller(MockBackend::new());
        let reply = route(&mut c, &Method::Get, "/", &HashMap::new(), "", now());
        assert_eq!(reply.status, 200);
        assert!(reply.content_type.starts_with("text/html"));

        let (status, body) = get(&mut c, "/api/nope");
        assert_eq!(status, 404);
        assert_eq!(body["ok"], json!(false));
    }

    #[test]
    fn test_line_lifecycle() {
        let mut c = controller(MockBackend::new());
        let (status, body) = post(&mut c, "/api/lines/add", json!({}));
        assert_eq!(status, 200);
        let id = body["id"].as_u64().unwrap();

        // Second empty line is refused.
        let (status, _) = post(&mut c, "/api/lines/add", json!({}));
        assert_eq!(status, 409);

        let (_, body) = post(&mut c, "/api/lines/cycle", json!({"id": id}));
        assert_eq!(body["comparator"], json!("!="));

        let (status, _) = post(
            &mut c,
            "/api/lines/update",
            json!({"id": id, "comparator": "&gt;=", "value": "5"}),
        );
        assert_eq!(status, 200);
        let (_, state) = get(&mut c, "/api/state");
        assert_eq!(state["lines"][0]["comparator"], json!("&gt;="));
        assert_eq!(state["lines"][0]["input"]["value"], json!("5"));

        let (status, _) = post(
            &mut c,
            "/api/lines/update",
            json!({"id": id, "comparator": "~"}),
        );
        assert_eq!(status, 400);

        let (status, _) = post(&mut c, "/api/lines/remove", json!({"id": id}));
        assert_eq!(status, 200);
        let (status, _) = post(&mut c, "/api/lines/remove", json!({"id": id}));
        assert_eq!(status, 404);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let mut c = controller(MockBackend::new());
        let reply = route(
            &mut c,
            &Method::Post,
            "/api/lines/remove",
            &HashMap::new(),
            "not json",
            now(),
        );
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains("Invalid JSON payload"));
    }

    #[test]
    fn test_search_and_table_actions() {
        let mut c = controller(loaded_backend());
        c.push_line("sender", Comparator::RegexInsensitive, "x.com");

        let (status, body) = post(&mut c, "/api/search", json!({"start": "", "end": ""}));
        assert_eq!(status, 200);
        assert_eq!(body["outcome"], json!("loaded"));
        assert_eq!(body["rows"], json!(2));

        let (_, body) = post(&mut c, "/api/rows/toggle", json!({"row": 1}));
        assert_eq!(body["active"], json!(true));
        let (status, _) = post(&mut c, "/api/rows/toggle", json!({"row": 9}));
        assert_eq!(status, 404);

        let (_, body) = post(&mut c, "/api/tags/toggle", json!({"tag": "spam"}));
        assert_eq!(body["active"], json!(false));
        let (_, state) = get(&mut c, "/api/state");
        assert_eq!(state["table"]["rows"], json!(1));

        let (status, _) = post(
            &mut c,
            "/api/columns/visible",
            json!({"column": "nope", "visible": true}),
        );
        assert_eq!(status, 404);
    }

    #[test]
    fn test_search_with_bad_date() {
        let mut c = controller(MockBackend::new());
        let (status, _) = post(&mut c, "/api/search", json!({"start": "2017-01-01"}));
        assert_eq!(status, 400);
    }

    #[test]
    fn test_rejected_search_reports_message() {
        let mut c = controller(MockBackend::new());
        let (status, body) = post(&mut c, "/api/search", json!({}));
        assert_eq!(status, 200);
        assert_eq!(body["outcome"], json!("rejected"));
        assert_eq!(body["ok"], json!(false));

        let (_, state) = get(&mut c, "/api/state");
        let id = state["messages"][0]["id"].as_u64().unwrap();
        let (status, _) = post(&mut c, "/api/messages/dismiss", json!({"id": id}));
        assert_eq!(status, 200);
        let (_, state) = get(&mut c, "/api/state");
        assert_eq!(state["messages"], json!([]));
    }

    #[test]
    fn test_highlight_returns_markup() {
        let mut c = controller(loaded_backend());
        c.push_line("sender", Comparator::RegexInsensitive, "x");
        post(&mut c, "/api/search", json!({}));

        let (_, body) = post(
            &mut c,
            "/api/highlight",
            json!({"row": 0, "token": "a@x.com"}),
        );
        assert_eq!(body["outcome"], json!("highlighted"));
        assert_eq!(body["matches"], json!(1));
        assert!(body["html"].as_str().unwrap().contains("a@x.com</span>"));

        let (_, body) = post(
            &mut c,
            "/api/highlight",
            json!({"row": 0, "token": "a@x.com"}),
        );
        assert_eq!(body["outcome"], json!("cleared"));
    }

    #[test]
    fn test_dashboard_and_drill_down() {
        let mut backend = loaded_backend();
        backend.counts.insert(String::new(), 10);
        backend.adv_counts.insert(
            "sender".into(),
            AdvCountResponse {
                total: 10,
                items: vec![CountItem {
                    key: "a@x.com".into(),
                    value: 3,
                }],
            },
        );
        let mut c = controller(backend);

        let (status, body) = get(&mut c, "/api/dashboard?hours=12");
        assert_eq!(status, 200);
        assert_eq!(body["lookback_hours"], json!(12));
        assert!(body["html"].as_str().unwrap().contains("data-key=\"a@x.com\""));

        let (status, _) = get(&mut c, "/api/dashboard?hours=0");
        assert_eq!(status, 400);

        let (_, body) = post(
            &mut c,
            "/api/drilldown",
            json!({"item": "senders", "entry": "a@x.com"}),
        );
        assert_eq!(body["outcome"], json!("loaded"));
        let (_, state) = get(&mut c, "/api/state");
        assert_eq!(state["view"], json!("search"));
        assert_eq!(state["lines"][0]["field"], json!("sender"));

        let (status, _) = post(
            &mut c,
            "/api/drilldown",
            json!({"item": "processed", "entry": "x"}),
        );
        assert_eq!(status, 404);
    }

    #[test]
    fn test_lookback_out_of_range_is_rejected() {
        let mut c = controller(MockBackend::new());

        for url in [
            "/api/dashboard?hours=4000000000",
            "/api/dashboard?hours=99999999999",
            "/api/dashboard?hours=-1",
        ] {
            let (status, body) = get(&mut c, url);
            assert_eq!(status, 400, "{}", url);
            assert_eq!(body["ok"], json!(false));
        }

        let (status, _) = post(
            &mut c,
            "/api/dashboard/lookback",
            json!({"hours": 4_000_000_000u32}),
        );
        assert_eq!(status, 400);
        let (status, _) = post(&mut c, "/api/dashboard/lookback", json!({"hours": 0}));
        assert_eq!(status, 400);
        assert_eq!(c.dashboard().lookback_hours(), 24);

        let (status, body) = get(
            &mut c,
            &format!("/api/dashboard?hours={}", MAX_LOOKBACK_HOURS),
        );
        assert_eq!(status, 200);
        assert_eq!(body["lookback_hours"], json!(MAX_LOOKBACK_HOURS));
    }

    #[test]
    fn test_tick_refreshes_only_dashboard_view() {
        let backend = Arc::new(MockBackend::new());
        let mut c = Controller::new(backend.clone(), Config::default());
        tick(&mut c, now());
        assert_eq!(backend.total_calls(), 0);

        c.set_view(View::Dashboard);
        tick(&mut c, now());
        assert!(backend.calls("count") > 0);
    }

    #[test]
    fn test_parse_query_params() {
        let (path, query) = split_url_and_query("/api/dashboard?hours=6&flag");
        assert_eq!(path, "/api/dashboard");
        assert_eq!(query.get("hours").map(String::as_str), Some("6"));
        assert_eq!(query.get("flag").map(String::as_str), Some(""));
    }
}
