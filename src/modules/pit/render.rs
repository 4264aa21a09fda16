use crate::services::localization::L10nProxy;
use crate::services::pit::format;
use crate::services::pit::{LedgerEntry, ModerationAction, ModerationResult, StatusReport};
use fluent::FluentArgs;

/// Lines shown before a list is cut short.
const LIST_LIMIT: usize = 15;
/// Room left under Discord's 2000 character message limit for the "more" line.
const CONTENT_BUDGET: usize = 1900;
const COMMENT_LIMIT: usize = 100;

/// Reply text for a command outcome.
pub fn result(l10n: &L10nProxy, result: &ModerationResult) -> String {
    let mut args = FluentArgs::new();
    args.set("userId", result.user_id.to_string());

    let mut lines = vec![];
    match &result.action {
        ModerationAction::Strike {
            strike_id,
            severity,
        } => {
            args.set(
                "strikeId",
                strike_id.map_or_else(|| "?".to_string(), |id| id.to_string()),
            );
            args.set("severity", *severity);
            lines.push(l10n.t("pit-strike-success", Some(&args)));
        }
        ModerationAction::Release {
            amended_strike: Some(id),
        } => {
            args.set("strikeId", *id);
            lines.push(l10n.t("pit-release-amended", Some(&args)));
        }
        ModerationAction::Release {
            amended_strike: None,
        } => lines.push(l10n.t("pit-release-success", Some(&args))),
        ModerationAction::RemoveStrike { strike_id } => {
            args.set("strikeId", *strike_id);
            lines.push(l10n.t("pit-remove-success", Some(&args)));
        }
        ModerationAction::EditComment { strike_id } => {
            args.set("strikeId", *strike_id);
            lines.push(l10n.t("pit-comment-success", Some(&args)));
        }
        ModerationAction::EditSeverity {
            strike_id,
            from,
            to,
        } => {
            args.set("strikeId", *strike_id);
            args.set("from", *from);
            args.set("to", *to);
            lines.push(l10n.t("pit-severity-success", Some(&args)));
        }
        ModerationAction::Warn => lines.push(l10n.t("pit-warn-success", Some(&args))),
        ModerationAction::SelfTimeout { duration } => {
            args.set("duration", format::duration(*duration));
            lines.push(l10n.t("pit-selftimeout-success", Some(&args)));
        }
        ModerationAction::ManualTimeout { duration } => {
            args.set("duration", format::duration(*duration));
            lines.push(l10n.t("pit-timeout-success", Some(&args)));
        }
        ModerationAction::MinigamePenalty { duration } => {
            args.set("duration", format::duration(*duration));
            lines.push(l10n.t("pit-roulette-bang", Some(&args)));
        }
        ModerationAction::ListStrikes => return strikes(l10n, &result.report),
        ModerationAction::ListWarnings => return warnings(l10n, &result.report),
        ModerationAction::Status => return status(l10n, result),
    }

    if !matches!(
        result.action,
        ModerationAction::Warn | ModerationAction::EditComment { .. }
    ) {
        if let Some(line) = format::pit_line(l10n, result.pit.as_ref()) {
            lines.push(line);
        }
    }

    if let Some(error) = &result.flag_error {
        let mut args = FluentArgs::new();
        args.set("error", error.clone());
        lines.push(l10n.t("pit-flag-failed", Some(&args)));
    }

    lines.join("\n")
}

fn status(l10n: &L10nProxy, result: &ModerationResult) -> String {
    let report = &result.report;
    let mut args = FluentArgs::new();
    args.set("userId", result.user_id.to_string());

    if report.is_empty() {
        return l10n.t("pit-status-clean", Some(&args));
    }

    args.set("active", report.active_strikes.len());
    args.set("expired", report.expired_strikes.len());
    args.set("removed", report.removed_strikes.len());
    args.set("warnings", report.warnings.len());
    args.set(
        "timeouts",
        report.timed_penalties.len() + report.minigame_penalties.len(),
    );

    let mut lines = vec![
        l10n.t("pit-status-header", Some(&args)),
        format::pit_line(l10n, result.pit.as_ref())
            .unwrap_or_else(|| l10n.t("pit-pit-none", None)),
        l10n.t("pit-status-summary", Some(&args)),
    ];

    if let Some(newest) = report.counted_strikes().first() {
        let mut args = FluentArgs::new();
        args.set("expires", format::relative(newest.timestamp + report.horizon));
        lines.push(l10n.t("pit-status-chain", Some(&args)));
    }

    lines.join("\n")
}

fn strikes(l10n: &L10nProxy, report: &StatusReport) -> String {
    let mut args = FluentArgs::new();
    args.set("userId", report.user_id.to_string());

    let mut rows: Vec<(&LedgerEntry, bool)> = report
        .active_strikes
        .iter()
        .map(|strike| (strike, true))
        .chain(report.expired_strikes.iter().map(|strike| (strike, false)))
        .chain(report.removed_strikes.iter().map(|strike| (strike, false)))
        .collect();
    if rows.is_empty() {
        return l10n.t("pit-strikes-empty", Some(&args));
    }
    rows.sort_by(|a, b| b.0.timestamp.cmp(&a.0.timestamp).then(b.0.id.cmp(&a.0.id)));

    let mut lines = vec![l10n.t("pit-strikes-header", Some(&args))];
    let shown = push_lines(&mut lines, rows.iter().map(|(strike, active)| {
        let mut args = FluentArgs::new();
        args.set("strikeId", strike.id);
        args.set("state", format::strike_state(l10n, strike, *active));
        args.set("severity", strike.severity);
        args.set("when", format::timestamp(strike.timestamp));
        args.set("comment", comment_suffix(strike));
        l10n.t("pit-strikes-line", Some(&args))
    }));
    push_more(l10n, &mut lines, rows.len() - shown);
    lines.join("\n")
}

fn warnings(l10n: &L10nProxy, report: &StatusReport) -> String {
    let mut args = FluentArgs::new();
    args.set("userId", report.user_id.to_string());

    if report.warnings.is_empty() {
        return l10n.t("pit-warnings-empty", Some(&args));
    }

    let mut lines = vec![l10n.t("pit-warnings-header", Some(&args))];
    let shown = push_lines(&mut lines, report.warnings.iter().map(|warning| {
        let mut args = FluentArgs::new();
        args.set("warningId", warning.id);
        args.set("when", format::timestamp(warning.timestamp));
        args.set(
            "moderator",
            warning
                .moderator_id
                .map_or_else(|| "-".to_string(), |id| format!("<@{id}>")),
        );
        args.set(
            "comment",
            warning.comment.as_deref().map(shorten).unwrap_or_default(),
        );
        l10n.t("pit-warnings-line", Some(&args))
    }));
    push_more(l10n, &mut lines, report.warnings.len() - shown);
    lines.join("\n")
}

fn comment_suffix(entry: &LedgerEntry) -> String {
    entry
        .comment
        .as_deref()
        .map_or_else(String::new, |comment| format!(" · {}", shorten(comment)))
}

fn shorten(comment: &str) -> String {
    if comment.chars().count() <= COMMENT_LIMIT {
        return comment.to_string();
    }
    let mut short: String = comment.chars().take(COMMENT_LIMIT - 1).collect();
    short.push('…');
    short
}

/// Appends up to [`LIST_LIMIT`] lines while the message stays within
/// [`CONTENT_BUDGET`] characters. Returns how many were added.
fn push_lines(lines: &mut Vec<String>, rows: impl Iterator<Item = String>) -> usize {
    let mut used: usize = lines.iter().map(|line| line.chars().count() + 1).sum();
    let mut shown = 0;
    for line in rows.take(LIST_LIMIT) {
        used += line.chars().count() + 1;
        if used > CONTENT_BUDGET {
            break;
        }
        lines.push(line);
        shown += 1;
    }
    shown
}

fn push_more(l10n: &L10nProxy, lines: &mut Vec<String>, hidden: usize) {
    if hidden > 0 {
        let mut args = FluentArgs::new();
        args.set("count", hidden);
        lines.push(l10n.t("pit-list-more", Some(&args)));
    }
}
