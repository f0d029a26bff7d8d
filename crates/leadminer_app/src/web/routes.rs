use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Form, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::stream::{self, Stream};
use leadminer_core::{ProgressMsg, Report};
use leadminer_engine::{ProgressSink, RunContext, RunId};
use miner_logging::{miner_debug, miner_error, miner_info, miner_warn};
use serde::Deserialize;

use super::form::{FormValues, SearchForm};
use super::render::{self, Results};
use super::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/progress-stream", get(progress_stream))
        .route("/download", get(download))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RunQuery {
    run: Option<String>,
}

impl RunQuery {
    /// `None` when absent, `Some(Err)` when present but not a run id.
    fn run_id(&self) -> Option<Result<RunId, uuid::Error>> {
        self.run
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(str::parse)
    }
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let values = FormValues::from_defaults(state.defaults());
    Html(render::page(&values, RunId::new(), None, None))
}

async fn submit(State(state): State<AppState>, Form(form): Form<SearchForm>) -> Response {
    let submission = match form.parse(state.defaults()) {
        Ok(submission) => submission,
        Err(err) => return rejected(&state, &form, &err.to_string()),
    };
    let search = match state.providers().get(submission.provider) {
        Ok(search) => search,
        Err(message) => return rejected(&state, &form, &message),
    };

    let run_id = submission.run_id;
    let context = state.runs().context(run_id);
    miner_info!("run {} via {}", run_id, submission.provider);
    let pipeline = state.pipeline().clone().with_search(search);
    let report = match pipeline.run(&submission.request, &*context).await {
        Ok(report) => report,
        Err(err) => return rejected(&state, &form, &err.to_string()),
    };

    let downloadable = persist_report(&state, run_id, &report).await;
    let results = Results {
        report: &report,
        run_id,
        downloadable,
    };
    let values = form.values(state.defaults());
    Html(render::page(&values, RunId::new(), None, Some(&results))).into_response()
}

/// Re-render the form with the submitted values and an error message.
fn rejected(state: &AppState, form: &SearchForm, message: &str) -> Response {
    miner_warn!("rejected submission: {}", message);
    let run_id = form.run_id();
    // A progress stream may already be waiting on this run.
    if let Some(context) = state.runs().get(run_id) {
        context.emit(ProgressMsg::Completed);
    }
    let values = form.values(state.defaults());
    (
        StatusCode::BAD_REQUEST,
        Html(render::page(&values, RunId::new(), Some(message), None)),
    )
        .into_response()
}

async fn persist_report(state: &AppState, run_id: RunId, report: &Report) -> bool {
    let reports = state.reports().clone();
    let keyword = report.keyword.clone();
    let text = report.text.clone();
    match tokio::task::spawn_blocking(move || reports.save(&keyword, run_id, &text)).await {
        Ok(Ok(path)) => {
            miner_info!("report for run {} written to {}", run_id, path.display());
            state.runs().record_report(run_id, path);
            true
        }
        Ok(Err(err)) => {
            miner_error!("could not write report for run {}: {}", run_id, err);
            false
        }
        Err(err) => {
            miner_error!("report writer task failed: {}", err);
            false
        }
    }
}

async fn progress_stream(
    State(state): State<AppState>,
    Query(query): Query<RunQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, &'static str)> {
    let run_id = match query.run_id() {
        Some(Ok(id)) => id,
        _ => return Err((StatusCode::BAD_REQUEST, "missing or invalid run id")),
    };
    miner_debug!("progress stream opened for run {}", run_id);
    let context = state.runs().context(run_id);
    let events = progress_events(context, state.inner.stream_poll, state.inner.stream_idle);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

struct Cursor {
    context: Arc<RunContext>,
    poll: Duration,
    idle_limit: Duration,
    idle_for: Duration,
    first: bool,
    done: bool,
}

/// One snapshot per poll tick until the run completes.
///
/// A run that never starts closes the stream after `idle_limit`; zero waits forever.
fn progress_events(
    context: Arc<RunContext>,
    poll: Duration,
    idle_limit: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let cursor = Cursor {
        context,
        poll,
        idle_limit,
        idle_for: Duration::ZERO,
        first: true,
        done: false,
    };
    stream::unfold(cursor, |mut cursor| async move {
        if cursor.done {
            return None;
        }
        if cursor.first {
            cursor.first = false;
        } else {
            tokio::time::sleep(cursor.poll).await;
        }

        let snapshot = cursor.context.snapshot();
        if snapshot.is_completed() {
            cursor.done = true;
        } else if snapshot.active {
            cursor.idle_for = Duration::ZERO;
        } else {
            cursor.idle_for += cursor.poll;
            if !cursor.idle_limit.is_zero() && cursor.idle_for > cursor.idle_limit {
                miner_debug!("closing idle progress stream for run {}", cursor.context.id());
                cursor.done = true;
            }
        }

        let event = Event::default().json_data(&snapshot).unwrap_or_else(|err| {
            miner_warn!("progress snapshot not serializable: {}", err);
            Event::default().comment("progress unavailable")
        });
        Some((Ok::<_, Infallible>(event), cursor))
    })
}

async fn download(State(state): State<AppState>, Query(query): Query<RunQuery>) -> Response {
    let path = match query.run_id() {
        Some(Ok(id)) => state.runs().get(id).and_then(|context| context.report_path()),
        Some(Err(_)) => return (StatusCode::BAD_REQUEST, "invalid run id").into_response(),
        None => state.runs().last_report(),
    };
    let Some(path) = path else {
        return (StatusCode::NOT_FOUND, "no report available").into_response();
    };

    let reports = state.reports().clone();
    let read_path = path.clone();
    match tokio::task::spawn_blocking(move || reports.load(&read_path)).await {
        Ok(Ok(text)) => {
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("leads.txt");
            (
                [
                    (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                text,
            )
                .into_response()
        }
        Ok(Err(err)) => {
            miner_warn!("report {} unavailable: {}", path.display(), err);
            (StatusCode::NOT_FOUND, "report file is no longer available").into_response()
        }
        Err(err) => {
            miner_error!("report reader task failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
