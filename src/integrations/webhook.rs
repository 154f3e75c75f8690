//! Webhook, Zapier, Make.com and Pabbly blocks.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, error, warn};

use crate::config::WebhookConfig;
use crate::engine::{BlockOutcome, EngineError};
use crate::error::InternalResult;
use crate::schema::{
    BasicAuth, BlockKind, ClientSideAction, ClientSideActionKind, ExecutableWebhook, HttpMethod,
    KeyValue, LogDetails, ReplyLog, SessionState, Typebot, Variable, VariableUpdate,
    VariableValue, Webhook, WebhookBlock, WebhookBlockOptions, WebhookResponse,
};
use crate::store::WebhookStore;
use crate::variables::{ParseOptions, is_single_variable, parse_variables, parse_variables_in_url};

use super::IntegrationContext;

pub const STATE_BODY: &str = "{{state}}";
const SUCCESS_DESCRIPTION: &str = "Webhook successfuly executed.";
const ERROR_DESCRIPTION: &str = "Webhook returned an error.";
const FAILURE_DESCRIPTION: &str = "Webhook failed to execute.";

lazy_static! {
    static ref BODY_PATH_SEGMENT: Regex = Regex::new(r#"([^.\[\]]+)|\[(\d+)\]"#).unwrap();
}

#[tracing::instrument(skip(ctx, state, block), level = "debug")]
pub async fn execute_webhook_block(
    ctx: &IntegrationContext<'_>,
    state: &SessionState,
    block: &WebhookBlock,
) -> BlockOutcome {
    let webhook_id = block.webhook_id.clone().unwrap_or_default();
    let webhook = match ctx.webhooks.find_webhook(&webhook_id).await {
        Ok(Some(webhook)) => webhook,
        Ok(None) => {
            warn!("Webhook {} not found", webhook_id);
            return BlockOutcome::new().with_log(ReplyLog::error(format!(
                "Couldn't find webhook with id {}",
                webhook_id
            )));
        }
        Err(e) => {
            warn!("Failed to load webhook {}: {}", webhook_id, e);
            return BlockOutcome::new().with_log(ReplyLog::error(format!(
                "Couldn't find webhook with id {}",
                webhook_id
            )));
        }
    };

    let prepared = prepare_webhook_attributes(webhook, &block.options);
    let Some(executable) = parse_webhook_attributes(state, prepared) else {
        return BlockOutcome::new().with_log(ReplyLog::error("Couldn't parse webhook attributes"));
    };

    if block.options.is_executed_on_client {
        debug!("Webhook delegated to the client");
        return BlockOutcome::new().with_action(ClientSideAction::new(
            ClientSideActionKind::WebhookToExecute(executable),
        ));
    }

    let (response, logs) = execute_webhook(ctx.http, &ctx.config.webhook, &executable).await;
    resume_webhook_execution(state, &block.options, &response, logs)
}

/// Applies the block's overrides to the stored record: without advanced
/// configuration the default attributes and the state body are forced,
/// without a custom body only the body is.
pub fn prepare_webhook_attributes(webhook: Webhook, options: &WebhookBlockOptions) -> Webhook {
    if options.is_advanced_config == Some(false) {
        Webhook {
            body: Some(STATE_BODY.to_string()),
            method: HttpMethod::Post,
            headers: Vec::new(),
            query_params: Vec::new(),
            ..webhook
        }
    } else if options.is_custom_body == Some(false) {
        Webhook {
            body: Some(STATE_BODY.to_string()),
            ..webhook
        }
    } else {
        webhook
    }
}

/// Resolves every templated attribute. `None` when the record has no URL.
pub fn parse_webhook_attributes(
    state: &SessionState,
    mut webhook: Webhook,
) -> Option<ExecutableWebhook> {
    let url = webhook.url.clone().filter(|url| !url.trim().is_empty())?;
    let variables = state.variables();

    let basic_auth = extract_basic_auth(&mut webhook.headers);
    let headers = key_values_to_map(&webhook.headers, variables);
    let query = key_values_to_map(&webhook.query_params, variables);

    let mut url = parse_variables_in_url(variables, &url);
    if !query.is_empty() {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.iter())
            .finish();
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&encoded);
    }

    let (body, is_json) = match body_content(state, webhook.body.as_deref()) {
        Some(content) if webhook.method != HttpMethod::Get => {
            let options = ParseOptions {
                escape_for_json: !is_single_variable(&content),
                ..Default::default()
            };
            let (data, is_json) = safe_json_parse(&parse_variables(variables, &content, &options));
            (Some(data), is_json)
        }
        _ => (None, false),
    };

    Some(ExecutableWebhook {
        url,
        method: webhook.method,
        headers: (!headers.is_empty()).then_some(headers),
        body,
        basic_auth,
        is_json,
    })
}

/// Removes an `Authorization: Basic user:pass` header and returns its
/// credentials.
fn extract_basic_auth(headers: &mut Vec<KeyValue>) -> BasicAuth {
    let index = headers.iter().position(|header| {
        header.key.as_deref().map(str::to_lowercase).as_deref() == Some("authorization")
            && header
                .value
                .as_deref()
                .is_some_and(|value| value.to_lowercase().contains("basic") && value.contains(':'))
    });
    let Some(index) = index else {
        return BasicAuth::default();
    };
    let header = headers.remove(index);
    let value = header.value.unwrap_or_default();
    let credentials = value.get(6..).unwrap_or_default();
    let mut parts = credentials.split(':');
    BasicAuth {
        username: parts.next().map(str::to_string),
        password: parts.next().map(str::to_string),
    }
}

fn key_values_to_map(items: &[KeyValue], variables: &[Variable]) -> BTreeMap<String, String> {
    items
        .iter()
        .filter_map(|item| {
            let key = item.key.as_deref().filter(|key| !key.is_empty())?;
            let value = parse_variables(
                variables,
                item.value.as_deref().unwrap_or_default(),
                &ParseOptions::default(),
            );
            Some((key.to_string(), value))
        })
        .collect()
}

fn body_content(state: &SessionState, body: Option<&str>) -> Option<String> {
    let body = body.filter(|body| !body.is_empty())?;
    if body != STATE_BODY {
        return Some(body.to_string());
    }
    let snapshot = state
        .result_snapshot()
        .unwrap_or_else(|| state.sample_snapshot());
    Some(snapshot.to_string())
}

fn safe_json_parse(text: &str) -> (JsonValue, bool) {
    match serde_json::from_str(text) {
        Ok(data) => (data, true),
        Err(_) => (JsonValue::String(text.to_string()), false),
    }
}

fn request_details(webhook: &ExecutableWebhook) -> JsonValue {
    json!({
        "url": webhook.url,
        "method": webhook.method,
        "headers": webhook.headers,
        "body": webhook.body,
    })
}

/// Sends the request. Never fails: HTTP errors and transport errors are
/// turned into a response plus an error log.
pub async fn execute_webhook(
    http: &reqwest::Client,
    config: &WebhookConfig,
    webhook: &ExecutableWebhook,
) -> (WebhookResponse, Vec<ReplyLog>) {
    let content_type = webhook
        .headers
        .as_ref()
        .and_then(|headers| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("content-type"))
        })
        .map(|(_, value)| value.as_str())
        .unwrap_or_default();
    let is_form = content_type.contains("x-www-form-urlencoded");

    let mut request = http
        .request(webhook.method.into(), &webhook.url)
        .timeout(config.timeout)
        .header(reqwest::header::USER_AGENT, &config.user_agent);
    if let Some(headers) = &webhook.headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    if let Some(username) = &webhook.basic_auth.username {
        request = request.basic_auth(username, webhook.basic_auth.password.as_ref());
    }
    request = match &webhook.body {
        // Raw form strings go out as is with the caller's Content-Type.
        Some(body @ JsonValue::Object(_)) if is_form && webhook.is_json => request.form(body),
        Some(body) if webhook.is_json => request.json(body),
        Some(JsonValue::String(text)) => request.body(text.clone()),
        Some(body) => request.body(body.to_string()),
        None => request,
    };

    let details = request_details(webhook);
    let result = match request.send().await {
        Ok(response) => {
            let status_code = response.status().as_u16();
            response
                .text()
                .await
                .map(|text| (status_code, safe_json_parse(&text).0))
        }
        Err(e) => Err(e),
    };

    match result {
        Ok((status_code, data)) => {
            let response = WebhookResponse { status_code, data };
            let log = if response.is_error() {
                warn!("Webhook returned {}", status_code);
                ReplyLog::error(ERROR_DESCRIPTION).with_details(LogDetails {
                    status_code: Some(status_code),
                    request: Some(details),
                    response: Some(response.to_json()),
                    ..Default::default()
                })
            } else {
                ReplyLog::success(SUCCESS_DESCRIPTION).with_details(LogDetails {
                    status_code: Some(status_code),
                    request: Some(details),
                    response: Some(response.data.clone()),
                    ..Default::default()
                })
            };
            (response, vec![log])
        }
        Err(e) => {
            error!("Webhook failed to execute: {}", e);
            let response = WebhookResponse {
                status_code: 500,
                data: json!({"message": format!("Error from server: {}", e)}),
            };
            let log = ReplyLog::error(FAILURE_DESCRIPTION).with_details(LogDetails {
                request: Some(details),
                response: Some(response.to_json()),
                ..Default::default()
            });
            (response, vec![log])
        }
    }
}

/// Maps a response into variables. `logs` is empty when the client executed
/// the request, in which case the outcome is logged here.
pub fn resume_webhook_execution(
    state: &SessionState,
    options: &WebhookBlockOptions,
    response: &WebhookResponse,
    mut logs: Vec<ReplyLog>,
) -> BlockOutcome {
    if logs.is_empty() {
        let log = if response.is_error() {
            ReplyLog::error(ERROR_DESCRIPTION)
        } else {
            ReplyLog::success(SUCCESS_DESCRIPTION)
        };
        logs.push(log.with_details(LogDetails {
            status_code: Some(response.status_code),
            response: Some(response.data.clone()),
            ..Default::default()
        }));
    }

    let variables = state.variables();
    let source = response.to_json();
    let updates: Vec<VariableUpdate> = options
        .response_variable_mapping
        .iter()
        .filter_map(|mapping| {
            let variable_id = mapping.variable_id.as_deref()?;
            let body_path = mapping.body_path.as_deref()?;
            let path = parse_variables(variables, body_path, &ParseOptions::default());
            let value = resolve_body_path(&source, &path)?;
            Some(VariableUpdate::new(variable_id, VariableValue::from_json(value)))
        })
        .collect();

    let mut outcome = BlockOutcome::new();
    outcome.logs = logs;
    if !updates.is_empty() {
        outcome = outcome.with_state(state.with_updated_variables(&updates));
    }
    outcome
}

/// Follows `data.items[0].name` style paths.
pub fn resolve_body_path<'a>(source: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    BODY_PATH_SEGMENT
        .captures_iter(path.trim())
        .try_fold(source, |current, captures| {
            if let Some(key) = captures.get(1) {
                match current {
                    JsonValue::Array(items) => key
                        .as_str()
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| items.get(index)),
                    _ => current.get(key.as_str()),
                }
            } else {
                let index: usize = captures.get(2)?.as_str().parse().ok()?;
                current.get(index)
            }
        })
}

/// Points the webhook record of a webhook-like block at `url`, with the
/// result snapshot as POST body.
#[tracing::instrument(skip(store, typebot), level = "debug")]
pub async fn subscribe_webhook(
    store: &dyn WebhookStore,
    typebot: &Typebot,
    block_id: &str,
    url: &str,
) -> InternalResult<Webhook> {
    let webhook_id = typebot
        .find_block(block_id)
        .and_then(|(_, _, block)| match &block.kind {
            BlockKind::Integration(integration) => integration.as_webhook(),
            _ => None,
        })
        .and_then(|block| block.webhook_id.clone())
        .ok_or_else(|| EngineError::NotAWebhookBlock(block_id.to_string()))?;

    let existing = store.find_webhook(&webhook_id).await?;
    let webhook = Webhook {
        url: Some(url.to_string()),
        method: HttpMethod::Post,
        body: Some(STATE_BODY.to_string()),
        ..existing.unwrap_or_else(|| Webhook::new(webhook_id))
    };
    store.upsert_webhook(webhook.clone()).await?;
    Ok(webhook)
}
