//! PR chain publishing
//!
//! Each stage gets one pull request whose base is the stage's parent branch.
//! Every PR body links the earlier stages (the base chain) and the later
//! stages (the dependent chain), so publishing one stage changes what the
//! other stages' descriptions should say. [`sync_descriptions`] re-renders
//! them from a fresh URL map after a batch.

use std::collections::BTreeSet;

use tracing::info;

use super::lifecycle::parent_branch_for_stage;
use crate::errors::{Result, StackError};
use crate::git::Vcs;
use crate::models::{Stack, Stage};
use crate::pr::{NewPullRequest, PullRequests};

/// What [`publish_stage`] did for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub stage_id: String,
    pub branch: String,
    pub force_with_lease: bool,
    /// Base branch that had to be pushed first because the remote lacked it.
    pub pushed_base: Option<String>,
    pub pr_url: String,
    /// True when a new PR was opened, false when an existing one was updated.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedDescription {
    pub stage_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub published: Vec<PublishOutcome>,
    pub synced: Vec<SyncedDescription>,
}

/// Open PR URL for every stage, by position.
pub fn collect_stack_pr_urls(stack: &Stack, prs: &dyn PullRequests) -> Result<Vec<Option<String>>> {
    (0..stack.stages.len())
        .map(|index| prs.find_open_pr_url(&stack.stage_branch(index)))
        .collect()
}

/// PR title: `<stack>: <title>`, using the id when the title is blank.
pub fn pr_title(stack: &Stack, stage: &Stage) -> String {
    let title = stage.title.trim();
    if title.is_empty() {
        format!("{}: {}", stack.name, stage.id)
    } else {
        format!("{}: {}", stack.name, stage.title)
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn chain_lines(stack: &Stack, indexes: std::ops::Range<usize>, urls: &[Option<String>]) -> Vec<String> {
    indexes
        .map(|index| {
            let id = &stack.stages[index].id;
            match urls.get(index).and_then(|u| u.as_deref()).map(str::trim) {
                Some(url) if !url.is_empty() => format!("- {id}: {url}"),
                _ => format!("- {id}: (not created)"),
            }
        })
        .collect()
}

/// Render the PR description for the stage at `index`.
///
/// `urls` holds each stage's open PR URL by position, as returned by
/// [`collect_stack_pr_urls`].
pub fn render_pr_body(stack: &Stack, index: usize, urls: &[Option<String>]) -> String {
    let stage = &stack.stages[index];
    let mut body = format!("Stage: {}", stage.id);

    if let Some(outcome) = stage.outcome_text() {
        body.push_str(&format!("\n\n## Outcome\n{outcome}"));
    }
    if !stage.implementation.is_empty() {
        body.push_str(&format!("\n\n## Implementation\n{}", bullet_list(&stage.implementation)));
    }
    if !stage.validation.is_empty() {
        body.push_str(&format!("\n\n## Validation\n{}", bullet_list(&stage.validation)));
    }
    if !stage.risks.is_empty() {
        let risks = stage
            .risks
            .iter()
            .map(|r| {
                format!(
                    "- Risk: {}\n  Mitigation: {}",
                    r.risk.trim(),
                    r.mitigation.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        body.push_str(&format!("\n\n## Risks\n{risks}"));
    }
    if let Some(context) = stage.context_text() {
        body.push_str(&format!("\n\n## Context\n{context}"));
    }
    if !stage.has_details() {
        body.push_str("\n\nNo implementation details found for this stage.");
    }

    body.push_str("\n\n## Stack PRs\n\n### Earlier stages (base chain)\n");
    let earlier = chain_lines(stack, 0..index, urls);
    if earlier.is_empty() {
        body.push_str("- None\n");
    } else {
        for line in earlier {
            body.push_str(&line);
            body.push('\n');
        }
    }

    body.push_str("\n### Later stages (dependent chain)\n");
    let later = chain_lines(stack, index + 1..stack.stages.len(), urls);
    if later.is_empty() {
        body.push_str("- None");
    } else {
        body.push_str(&later.join("\n"));
    }

    body
}

/// Push the stage's branch and create or update its pull request.
///
/// The base branch is pushed first when a later stage's base is missing on
/// the remote. An existing open PR is only edited, never duplicated.
pub fn publish_stage(
    stack: &Stack,
    index: usize,
    force_with_lease: bool,
    vcs: &dyn Vcs,
    prs: &dyn PullRequests,
) -> Result<PublishOutcome> {
    if index >= stack.stages.len() {
        return Err(StackError::StageOutOfRange {
            index,
            len: stack.stages.len(),
        });
    }
    let stage = &stack.stages[index];
    let branch = stack.stage_branch(index);
    if !vcs.branch_exists(&branch) {
        return Err(StackError::StageNotStarted { branch });
    }

    vcs.push(&branch, force_with_lease)?;
    let existing = prs.find_open_pr_url(&branch)?;

    let base = parent_branch_for_stage(stack, index, vcs)?;
    let mut pushed_base = None;
    if index > 0 && !vcs.remote_branch_exists(&base) {
        info!(base, "base branch missing on remote, pushing it");
        vcs.push(&base, false)?;
        pushed_base = Some(base.clone());
    }

    let urls = collect_stack_pr_urls(stack, prs)?;
    let body = render_pr_body(stack, index, &urls);

    let (pr_url, created) = match existing {
        Some(url) => {
            prs.edit_body(&url, &body)?;
            (url, false)
        }
        None => {
            let title = pr_title(stack, stage);
            prs.create(&NewPullRequest {
                head: &branch,
                base: &base,
                title: &title,
                body: &body,
            })?;
            let url = prs
                .find_open_pr_url(&branch)?
                .ok_or_else(|| StackError::PrUrlUnresolved {
                    branch: branch.clone(),
                })?;
            (url, true)
        }
    };

    Ok(PublishOutcome {
        stage_id: stage.id.clone(),
        branch,
        force_with_lease,
        pushed_base,
        pr_url,
        created,
    })
}

/// Re-render and push the description of every stage in `indexes` that has
/// an open PR.
///
/// Indexes are deduplicated; out-of-range ones are ignored.
pub fn sync_descriptions(
    stack: &Stack,
    indexes: &[usize],
    prs: &dyn PullRequests,
) -> Result<Vec<SyncedDescription>> {
    if indexes.is_empty() {
        return Ok(Vec::new());
    }

    let urls = collect_stack_pr_urls(stack, prs)?;
    let mut seen = BTreeSet::new();
    let mut synced = Vec::new();
    for &index in indexes {
        if index >= stack.stages.len() || !seen.insert(index) {
            continue;
        }
        let Some(url) = urls[index].as_deref() else {
            continue;
        };
        let body = render_pr_body(stack, index, &urls);
        prs.edit_body(url, &body)?;
        synced.push(SyncedDescription {
            stage_id: stack.stages[index].id.clone(),
            url: url.to_string(),
        });
    }
    Ok(synced)
}

/// Publish each stage in `indexes` in order, then sync all their
/// descriptions once.
///
/// `on_published` is called after each stage so progress can be reported
/// before the batch finishes. The first failure stops the batch.
pub fn publish_batch(
    stack: &Stack,
    indexes: &[usize],
    force_with_lease: bool,
    vcs: &dyn Vcs,
    prs: &dyn PullRequests,
    mut on_published: impl FnMut(&PublishOutcome),
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for &index in indexes {
        let outcome = publish_stage(stack, index, force_with_lease, vcs, prs)?;
        on_published(&outcome);
        report.published.push(outcome);
    }
    report.synced = sync_descriptions(stack, indexes, prs)?;
    Ok(report)
}

/// Earlier stages (before `current_index`) whose branch is not on the remote.
pub fn stage_indexes_to_push(
    stack: &Stack,
    current_index: usize,
    remote_branch_exists: impl Fn(&str) -> bool,
) -> Result<Vec<usize>> {
    if current_index >= stack.stages.len() {
        return Err(StackError::StageOutOfRange {
            index: current_index,
            len: stack.stages.len(),
        });
    }
    Ok((0..current_index)
        .filter(|&index| !remote_branch_exists(&stack.stage_branch(index)))
        .collect())
}

/// Stages whose local branch exists.
pub fn started_stage_indexes(stack: &Stack, local_branch_exists: impl Fn(&str) -> bool) -> Vec<usize> {
    (0..stack.stages.len())
        .filter(|&index| local_branch_exists(&stack.stage_branch(index)))
        .collect()
}
