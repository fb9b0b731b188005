//! Synchronization of manual attachments to provider resource references.

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::error::SyncResult;
use crate::domains::tools::{DynToolRepository, ResourceRefs};
use crate::domains::uploads::DynResourceUploader;

/// What a single-record run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No record with that id.
    Skipped,

    /// The tool has no manuals; nothing was written.
    NoAttachments,

    /// Every upload failed; nothing was written.
    NothingUploaded { failed: usize },

    /// The reference field was overwritten.
    Updated {
        references: String,
        uploaded: usize,
        failed: usize,
    },
}

/// Outcome for one tool of a full-catalog run.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSync {
    pub id: String,
    pub name: String,
    pub outcome: SyncOutcome,
}

/// Result of [`SyncJob::sync_all`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub tools: Vec<ToolSync>,
}

impl SyncReport {
    /// Number of tools whose reference field was rewritten.
    pub fn updated(&self) -> usize {
        self.tools
            .iter()
            .filter(|t| matches!(t.outcome, SyncOutcome::Updated { .. }))
            .count()
    }

    /// Attachment uploads that failed across the run.
    pub fn failed_uploads(&self) -> usize {
        self.tools
            .iter()
            .map(|t| match t.outcome {
                SyncOutcome::NothingUploaded { failed } | SyncOutcome::Updated { failed, .. } => failed,
                _ => 0,
            })
            .sum()
    }
}

/// Brings tools' resource references up to date with their manuals.
///
/// Every run re-uploads every attachment; existing references are not
/// diffed or reused.
pub struct SyncJob {
    repository: DynToolRepository,
    uploader: DynResourceUploader,
}

impl SyncJob {
    pub fn new(repository: DynToolRepository, uploader: DynResourceUploader) -> Self {
        Self {
            repository,
            uploader,
        }
    }

    /// Synchronize one record.
    ///
    /// A missing record is a skip, not an error. Individual upload failures
    /// are logged and counted; only catalog errors abort.
    #[instrument(skip(self))]
    pub async fn sync_record(&self, record_id: &str) -> SyncResult<SyncOutcome> {
        let Some(tool) = self.repository.get_tool(record_id).await? else {
            warn!("Tool {} not found, skipping", record_id);
            return Ok(SyncOutcome::Skipped);
        };

        if tool.manual_attachments.is_empty() {
            info!("No manuals for {}", tool.name);
            return Ok(SyncOutcome::NoAttachments);
        }

        let mut references = ResourceRefs::new();
        let mut failed = 0;
        for attachment in &tool.manual_attachments {
            if attachment.url.trim().is_empty() {
                continue;
            }
            match self.uploader.upload(&attachment.url, &attachment.filename).await {
                Ok(reference) => {
                    if !references.push(reference) {
                        failed += 1;
                    }
                }
                Err(e) => {
                    warn!("Error uploading {}: {}", attachment.filename, e);
                    failed += 1;
                }
            }
        }

        if references.is_empty() {
            warn!("No manuals of {} could be uploaded", tool.name);
            return Ok(SyncOutcome::NothingUploaded { failed });
        }

        self.repository
            .set_resource_references(&tool.id, &references)
            .await?;
        info!(
            "Updated {} with {} Gemini files ({} failed)",
            tool.name,
            references.len(),
            failed
        );

        Ok(SyncOutcome::Updated {
            references: references.join(),
            uploaded: references.len(),
            failed,
        })
    }

    /// Synchronize every tool in catalog order, one at a time.
    ///
    /// There is no checkpoint: a catalog error stops the run and a restart
    /// begins again from the first tool.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> SyncResult<SyncReport> {
        let tools = self.repository.list_tools().await?;
        info!("Found {} tools, syncing", tools.len());

        let mut report = SyncReport::default();
        for tool in tools {
            info!("Syncing tool: {} ({})", tool.name, tool.id);
            let outcome = self.sync_record(&tool.id).await?;
            report.tools.push(ToolSync {
                id: tool.id,
                name: tool.name,
                outcome,
            });
        }

        info!(
            "Sync complete: {} updated, {} failed uploads",
            report.updated(),
            report.failed_uploads()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::sync::SyncError;
    use crate::domains::tools::{ToolError, ToolRepository};
    use crate::testing::{FakeUploader, MemoryRepository, tool};
    use std::sync::Arc;

    fn job(repo: &Arc<MemoryRepository>, uploader: &Arc<FakeUploader>) -> SyncJob {
        SyncJob::new(repo.clone(), uploader.clone())
    }

    #[tokio::test]
    async fn test_both_uploads_succeed_writes_once() {
        let repo = Arc::new(MemoryRepository::with_tools(vec![tool(
            "rec123",
            "Laser Cutter",
            &[("http://x/m1.pdf", "m1.pdf"), ("http://x/m2.pdf", "m2.pdf")],
        )]));
        let uploader = Arc::new(FakeUploader::new(&[
            ("http://x/m1.pdf", "files/a1"),
            ("http://x/m2.pdf", "files/a2"),
        ]));

        let outcome = job(&repo, &uploader).sync_record("rec123").await.unwrap();

        assert_eq!(
            repo.writes(),
            vec![("rec123".to_string(), "files/a1,files/a2".to_string())]
        );
        assert_eq!(
            outcome,
            SyncOutcome::Updated {
                references: "files/a1,files/a2".to_string(),
                uploaded: 2,
                failed: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_successful_reference() {
        let repo = Arc::new(MemoryRepository::with_tools(vec![tool(
            "rec1",
            "Band Saw",
            &[("http://x/broken.pdf", "broken.pdf"), ("http://x/ok.pdf", "ok.pdf")],
        )]));
        let uploader = Arc::new(FakeUploader::new(&[("http://x/ok.pdf", "files/ok")]));

        let outcome = job(&repo, &uploader).sync_record("rec1").await.unwrap();

        assert_eq!(uploader.calls().len(), 2);
        assert_eq!(repo.writes(), vec![("rec1".to_string(), "files/ok".to_string())]);
        assert!(matches!(outcome, SyncOutcome::Updated { failed: 1, uploaded: 1, .. }));
    }

    #[tokio::test]
    async fn test_no_attachments_leaves_field_unchanged() {
        let mut existing = tool("rec1", "Soldering Iron", &[]);
        existing.gemini_resource_ids = Some("files/old".to_string());
        let repo = Arc::new(MemoryRepository::with_tools(vec![existing]));
        let uploader = Arc::new(FakeUploader::default());

        let outcome = job(&repo, &uploader).sync_record("rec1").await.unwrap();

        assert_eq!(outcome, SyncOutcome::NoAttachments);
        assert!(repo.writes().is_empty());
        let stored = repo.get_tool("rec1").await.unwrap().unwrap();
        assert_eq!(stored.gemini_resource_ids.as_deref(), Some("files/old"));
    }

    #[tokio::test]
    async fn test_zero_successful_uploads_never_writes() {
        let repo = Arc::new(MemoryRepository::with_tools(vec![tool(
            "rec1",
            "Lathe",
            &[("http://x/a.pdf", "a.pdf"), ("http://x/b.pdf", "b.pdf")],
        )]));
        let uploader = Arc::new(FakeUploader::default());

        let outcome = job(&repo, &uploader).sync_record("rec1").await.unwrap();

        assert_eq!(outcome, SyncOutcome::NothingUploaded { failed: 2 });
        assert!(repo.writes().is_empty());
    }

    #[tokio::test]
    async fn test_blank_attachment_urls_are_skipped() {
        let repo = Arc::new(MemoryRepository::with_tools(vec![tool(
            "rec1",
            "Drill Press",
            &[("", "ghost.pdf"), ("http://x/real.pdf", "real.pdf")],
        )]));
        let uploader = Arc::new(FakeUploader::new(&[("http://x/real.pdf", "files/r1")]));

        job(&repo, &uploader).sync_record("rec1").await.unwrap();

        assert_eq!(uploader.calls(), vec!["http://x/real.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_record_is_skipped() {
        let repo = Arc::new(MemoryRepository::default());
        let uploader = Arc::new(FakeUploader::default());

        let outcome = job(&repo, &uploader).sync_record("recNope").await.unwrap();

        assert_eq!(outcome, SyncOutcome::Skipped);
        assert!(uploader.calls().is_empty());
    }

    #[tokio::test]
    async fn test_store_outage_is_an_error() {
        let repo = Arc::new(MemoryRepository::default());
        repo.set_unavailable(true);
        let uploader = Arc::new(FakeUploader::default());

        let err = job(&repo, &uploader).sync_record("rec1").await.unwrap_err();
        assert!(matches!(err, SyncError::Store(ToolError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_sync_all_runs_every_tool_in_order() {
        let repo = Arc::new(MemoryRepository::with_tools(vec![
            tool("rec1", "Laser Cutter", &[("http://x/l.pdf", "l.pdf")]),
            tool("rec2", "Soldering Iron", &[]),
            tool("rec3", "Band Saw", &[("http://x/b.pdf", "b.pdf"), ("http://x/x.pdf", "x.pdf")]),
        ]));
        let uploader = Arc::new(FakeUploader::new(&[
            ("http://x/l.pdf", "files/l"),
            ("http://x/b.pdf", "files/b"),
        ]));

        let report = job(&repo, &uploader).sync_all().await.unwrap();

        let ids: Vec<&str> = report.tools.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["rec1", "rec2", "rec3"]);
        assert_eq!(report.updated(), 2);
        assert_eq!(report.failed_uploads(), 1);
        assert_eq!(
            uploader.calls(),
            vec!["http://x/l.pdf", "http://x/b.pdf", "http://x/x.pdf"]
        );
    }

    #[tokio::test]
    async fn test_sync_all_stops_at_mid_batch_store_error() {
        let repo = Arc::new(MemoryRepository::with_tools(vec![
            tool("rec1", "Laser Cutter", &[("http://x/l.pdf", "l.pdf")]),
            tool("rec2", "Band Saw", &[("http://x/b.pdf", "b.pdf")]),
            tool("rec3", "Lathe", &[("http://x/t.pdf", "t.pdf")]),
        ]));
        repo.fail_get_tool_from(2);
        let uploader = Arc::new(FakeUploader::new(&[
            ("http://x/l.pdf", "files/l"),
            ("http://x/b.pdf", "files/b"),
            ("http://x/t.pdf", "files/t"),
        ]));

        let err = job(&repo, &uploader).sync_all().await.unwrap_err();

        assert!(matches!(err, SyncError::Store(ToolError::UpstreamUnavailable(_))));
        assert_eq!(repo.writes(), vec![("rec1".to_string(), "files/l".to_string())]);
        assert_eq!(uploader.calls(), vec!["http://x/l.pdf"]);
    }

    #[tokio::test]
    async fn test_sync_all_aborts_when_store_is_down() {
        let repo = Arc::new(MemoryRepository::default());
        repo.set_unavailable(true);
        let uploader = Arc::new(FakeUploader::default());

        assert!(job(&repo, &uploader).sync_all().await.is_err());
    }
}
