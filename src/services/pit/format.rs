//! Turns engine values into localized Discord text.

use super::ModerationAction;
use super::ledger::LedgerEntry;
use super::reconcile::{Pit, PitSource};
use super::sync::Notice;
use crate::services::localization::L10nProxy;
use crate::services::logger::{LogEntry, LogLevel};
use chrono::{DateTime, Duration, Utc};
use fluent::FluentArgs;

/// Discord timestamp markup, rendered in the reader's timezone.
pub fn timestamp(at: DateTime<Utc>) -> String {
    format!("<t:{}:f>", at.timestamp())
}

pub fn relative(at: DateTime<Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}

/// `1d 2h 3m`, dropping zero parts. Sub-minute durations are shown in seconds.
pub fn duration(d: Duration) -> String {
    let total_minutes = d.num_minutes();
    if total_minutes == 0 {
        return format!("{}s", d.num_seconds().max(0));
    }

    let days = total_minutes / (24 * 60);
    let hours = total_minutes / 60 % 24;
    let minutes = total_minutes % 60;

    let mut parts = vec![];
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.join(" ")
}

pub fn source(l10n: &L10nProxy, source: PitSource) -> String {
    l10n.t(
        match source {
            PitSource::Strike => "pit-source-strike",
            PitSource::TimedPenalty => "pit-source-timeout",
            PitSource::MinigamePenalty => "pit-source-minigame",
            PitSource::Release => "pit-source-release",
        },
        None,
    )
}

/// One line describing the current pit, or `None` without any history.
pub fn pit_line(l10n: &L10nProxy, pit: Option<&Pit>) -> Option<String> {
    let pit = pit?;
    let mut args = FluentArgs::new();
    args.set("source", source(l10n, pit.source));
    args.set("release", timestamp(pit.release_time));
    args.set("remaining", relative(pit.release_time));
    Some(if pit.active {
        l10n.t("pit-pit-active", Some(&args))
    } else {
        l10n.t("pit-pit-inactive", Some(&args))
    })
}

pub fn strike_state(l10n: &L10nProxy, strike: &LedgerEntry, active: bool) -> String {
    if strike.is_removed() {
        l10n.t("pit-strike-state-removed", None)
    } else if active {
        l10n.t("pit-strike-state-active", None)
    } else {
        l10n.t("pit-strike-state-expired", None)
    }
}

/// Text of the DM a user receives for a notice, if that notice is ever DMed.
pub fn direct_message(l10n: &L10nProxy, notice: &Notice) -> Option<String> {
    match notice {
        Notice::Pitted { pit, reason, .. } => {
            let mut args = FluentArgs::new();
            args.set("release", timestamp(pit.release_time));
            args.set("remaining", relative(pit.release_time));
            args.set("source", source(l10n, pit.source));
            args.set("reason", reason.clone());
            Some(l10n.t("pit-dm-pitted", Some(&args)))
        }
        Notice::Released { reason, .. } => {
            let mut args = FluentArgs::new();
            args.set("reason", reason.clone());
            Some(l10n.t("pit-dm-released", Some(&args)))
        }
        Notice::StrikeExpired { strike, .. } => {
            let mut args = FluentArgs::new();
            args.set("strikeId", strike.id);
            args.set("severity", strike.severity);
            Some(l10n.t("pit-dm-strike-expired", Some(&args)))
        }
        Notice::Action { .. } | Notice::FlagFailed { .. } => None,
    }
}

fn action_title(action: &ModerationAction) -> &'static str {
    match action {
        ModerationAction::Strike { .. } => "pit-log-title-strike",
        ModerationAction::Release { .. } => "pit-log-title-release",
        ModerationAction::RemoveStrike { .. } => "pit-log-title-remove-strike",
        ModerationAction::EditComment { .. } => "pit-log-title-edit-comment",
        ModerationAction::EditSeverity { .. } => "pit-log-title-edit-severity",
        ModerationAction::Warn => "pit-log-title-warn",
        ModerationAction::SelfTimeout { .. } => "pit-log-title-self-timeout",
        ModerationAction::ManualTimeout { .. } => "pit-log-title-timeout",
        ModerationAction::MinigamePenalty { .. } => "pit-log-title-minigame",
        ModerationAction::ListStrikes | ModerationAction::ListWarnings | ModerationAction::Status => {
            "pit-log-title-lookup"
        }
    }
}

fn action_fields(l10n: &L10nProxy, action: &ModerationAction) -> Vec<(String, String)> {
    let field = |key: &str, value: String| (l10n.t(key, None), value);

    match action {
        ModerationAction::Strike {
            strike_id,
            severity,
        } => {
            let mut fields = vec![field("pit-log-field-severity", severity.to_string())];
            if let Some(id) = strike_id {
                fields.push(field("pit-log-field-strike", format!("#{id}")));
            }
            fields
        }
        ModerationAction::Release {
            amended_strike: Some(id),
        } => vec![field("pit-log-field-amended", format!("#{id}"))],
        ModerationAction::RemoveStrike { strike_id } | ModerationAction::EditComment { strike_id } => {
            vec![field("pit-log-field-strike", format!("#{strike_id}"))]
        }
        ModerationAction::EditSeverity {
            strike_id,
            from,
            to,
        } => vec![
            field("pit-log-field-strike", format!("#{strike_id}")),
            field("pit-log-field-severity", format!("{from} → {to}")),
        ],
        ModerationAction::SelfTimeout { duration: d }
        | ModerationAction::ManualTimeout { duration: d }
        | ModerationAction::MinigamePenalty { duration: d } => {
            vec![field("pit-log-field-duration", duration(*d))]
        }
        _ => vec![],
    }
}

/// Log-channel entry for a notice.
pub fn log_entry(l10n: &L10nProxy, notice: &Notice) -> LogEntry {
    match notice {
        Notice::Action {
            user_id,
            moderator_id,
            action,
            pit,
        } => {
            let mut args = FluentArgs::new();
            args.set("userId", user_id.to_string());
            let description = match moderator_id {
                Some(moderator_id) => {
                    args.set("moderatorId", moderator_id.to_string());
                    l10n.t("pit-log-desc-moderator", Some(&args))
                }
                None => l10n.t("pit-log-desc-target", Some(&args)),
            };

            let mut fields = action_fields(l10n, action);
            if let Some(line) = pit_line(l10n, pit.as_ref()) {
                fields.push((l10n.t("pit-log-field-pit", None), line));
            }

            LogEntry {
                level: LogLevel::Audit,
                title: l10n.t(action_title(action), None),
                description,
                fields,
            }
        }
        Notice::Pitted {
            user_id,
            pit,
            reason,
        } => {
            let mut args = FluentArgs::new();
            args.set("userId", user_id.to_string());
            LogEntry {
                level: LogLevel::Info,
                title: l10n.t("pit-log-title-pitted", None),
                description: l10n.t("pit-log-desc-target", Some(&args)),
                fields: vec![
                    (l10n.t("pit-log-field-reason", None), reason.clone()),
                    (
                        l10n.t("pit-log-field-pit", None),
                        pit_line(l10n, Some(pit)).unwrap_or_default(),
                    ),
                ],
            }
        }
        Notice::Released { user_id, reason } => {
            let mut args = FluentArgs::new();
            args.set("userId", user_id.to_string());
            LogEntry {
                level: LogLevel::Info,
                title: l10n.t("pit-log-title-released", None),
                description: l10n.t("pit-log-desc-target", Some(&args)),
                fields: vec![(l10n.t("pit-log-field-reason", None), reason.clone())],
            }
        }
        Notice::StrikeExpired { user_id, strike } => {
            let mut args = FluentArgs::new();
            args.set("userId", user_id.to_string());
            LogEntry {
                level: LogLevel::Info,
                title: l10n.t("pit-log-title-strike-expired", None),
                description: l10n.t("pit-log-desc-target", Some(&args)),
                fields: vec![(l10n.t("pit-log-field-strike", None), format!("#{}", strike.id))],
            }
        }
        Notice::FlagFailed {
            user_id,
            flagged,
            error,
        } => {
            let mut args = FluentArgs::new();
            args.set("userId", user_id.to_string());
            args.set("flagged", if *flagged { "true" } else { "false" });
            args.set("error", error.clone());
            LogEntry {
                level: LogLevel::Error,
                title: l10n.t("pit-log-title-flag-failed", None),
                description: l10n.t("pit-log-desc-flag-failed", Some(&args)),
                fields: vec![],
            }
        }
    }
}
