use anyhow::{Context, Result};
use darshan_composer::{ComposeOptions, Composer, Profile, TruthPackage};
use darshan_history::{unix_ms_now, MemoryUsageStore, UsageRecord, UsageStore};
use darshan_intent::score_state;
use darshan_narrative::NarrativeGateway;
use darshan_protocol::{Capabilities, CommandAction, CommandRequest, CommandResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// How much history feeds the anti-repetition lists on user-scoped draws.
const RECENT_SACRED_LIMIT: usize = 5;
const RECENT_STATE_LIMIT: usize = 2;
const RECENT_WINDOW_MS: u64 = 30 * 86_400_000;

/// Everything a command needs, built once and shared across requests.
pub struct CommandContext {
    pub composer: Composer,
    pub gateway: NarrativeGateway,
    pub history: MemoryUsageStore,
}

impl CommandContext {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            composer: Composer::builtin().context("Failed to load builtin content packs")?,
            gateway: NarrativeGateway::from_env(),
            history: MemoryUsageStore::default(),
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DrawPayload {
    /// History key; draws with a user consult and update the usage store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(flatten)]
    pub options: ComposeOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParseIntentPayload {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SutraContextPayload {
    pub id: String,
}

pub async fn execute(ctx: &CommandContext, request: CommandRequest) -> CommandResponse {
    match request.action {
        CommandAction::Draw => match parse_payload::<DrawPayload>(request.payload) {
            Ok(payload) => match draw(ctx, payload) {
                Ok(package) => ok_json(&package),
                Err(err) => CommandResponse::error("content_error", format!("{err:#}"), None),
            },
            Err(response) => response,
        },
        CommandAction::ParseIntent => match parse_payload::<ParseIntentPayload>(request.payload) {
            Ok(payload) => {
                let intent = ctx.composer.parser().parse(Some(&payload.text));
                let state_key = score_state(intent.as_ref());
                ok_json(&json!({ "intent": intent, "state_key": state_key }))
            }
            Err(response) => response,
        },
        CommandAction::SutraContext => match parse_payload::<SutraContextPayload>(request.payload)
        {
            // Unknown ids are "no context available", not errors.
            Ok(payload) => ok_json(&ctx.composer.corpus().resolve_sutra_context(&payload.id)),
            Err(response) => response,
        },
        CommandAction::Expand => match parse_payload::<DrawPayload>(request.payload) {
            Ok(payload) => {
                let question = payload.options.question.clone().unwrap_or_default();
                match draw(ctx, payload) {
                    Ok(package) => {
                        let narrative =
                            ctx.gateway.expand(&package, &question, package.theme).await;
                        ok_json(&json!({ "package": package, "narrative": narrative }))
                    }
                    Err(err) => {
                        CommandResponse::error("content_error", format!("{err:#}"), None)
                    }
                }
            }
            Err(response) => response,
        },
        CommandAction::States => ok_json(&ctx.composer.states().states()),
        CommandAction::Capabilities => {
            ok_json(&Capabilities::current("darshan", env!("CARGO_PKG_VERSION")))
        }
    }
}

fn draw(ctx: &CommandContext, payload: DrawPayload) -> Result<TruthPackage> {
    let mut options = payload.options;
    let now_ms = options.now_ms.unwrap_or_else(unix_ms_now);

    if let Some(user) = &payload.user {
        let mut sacred = ctx.history.recent_sacred_ids(
            user,
            RECENT_SACRED_LIMIT,
            RECENT_WINDOW_MS,
            now_ms,
        );
        options.recent_sacred_ids.append(&mut sacred);
        let mut states =
            ctx.history
                .recent_state_keys(user, RECENT_STATE_LIMIT, RECENT_WINDOW_MS, now_ms);
        options.recent_state_keys.append(&mut states);
    }

    let package = ctx
        .composer
        .compose(payload.profile.as_ref(), &options)
        .context("Composition failed")?;

    if let Some(user) = &payload.user {
        ctx.history.record(
            user,
            UsageRecord {
                sacred_id: package.sacred_id.clone(),
                state_key: package.state_key.clone(),
                at_ms: now_ms,
            },
        );
    }

    Ok(package)
}

fn parse_payload<T: for<'de> Deserialize<'de>>(
    payload: serde_json::Value,
) -> std::result::Result<T, CommandResponse> {
    serde_json::from_value(payload).map_err(|err| {
        CommandResponse::error(
            "invalid_request",
            format!("Invalid payload: {err}"),
            Some("Check the payload fields against `capabilities`.".to_string()),
        )
    })
}

fn ok_json<T: serde::Serialize>(value: &T) -> CommandResponse {
    match serde_json::to_value(value) {
        Ok(data) => CommandResponse::ok(data),
        Err(err) => CommandResponse::error("internal", format!("Serialization failed: {err}"), None),
    }
}
