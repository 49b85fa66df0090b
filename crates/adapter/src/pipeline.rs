use chrono::{DateTime, Utc};
use domain::{
    classify, Comment, FailureKind, HoldReason, LifecycleAction, PolicyConfig, RunSummary,
    ServiceError,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::rate_limit::RateLimiter;
use crate::strategy::render;
use crate::traits::{RemoteContentService, TextGenerator};

pub struct Pipeline<S> {
    service: S,
    policy: PolicyConfig,
    generator: Option<Arc<dyn TextGenerator>>,
    limiter: RateLimiter,
}

impl<S: RemoteContentService> Pipeline<S> {
    pub fn new(service: S, policy: PolicyConfig, limiter: RateLimiter) -> Self {
        Self {
            service,
            policy,
            generator: None,
            limiter,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn run_once(&self) -> Result<RunSummary, ServiceError> {
        self.run_once_at(Utc::now()).await
    }

    /// 一次完整的 拉取 -> 分类 -> 执行。
    /// 只有认证或拉取失败会中止本轮；单条评论的失败记入汇总。
    pub async fn run_once_at(&self, now: DateTime<Utc>) -> Result<RunSummary, ServiceError> {
        info!(
            "Checking comments: obfuscation after {} minutes, deletion after {} minutes",
            self.policy.expire_after().num_minutes(),
            self.policy.delete_after().num_minutes()
        );

        let session = self.service.authenticate().await?;
        let comments = self
            .service
            .list_own_comments(&session, self.policy.comment_limit())
            .await?;

        let mut summary = RunSummary::default();
        for comment in comments.iter().take(self.policy.comment_limit()) {
            let action = classify(comment, now, &self.policy);
            self.execute(&session, comment, action, &mut summary).await;
        }

        Ok(summary)
    }

    async fn execute(
        &self,
        session: &S::Session,
        comment: &Comment,
        action: LifecycleAction,
        summary: &mut RunSummary,
    ) {
        match action {
            LifecycleAction::NoOp(reason) => {
                match reason {
                    HoldReason::Ignored => debug!("Skipping comment {}: contains ignore flag", comment.id),
                    HoldReason::TooNew => debug!(
                        "Comment {} from {} not ready for processing yet",
                        comment.id, comment.created_at
                    ),
                    HoldReason::AwaitingDeletion => {
                        debug!("Comment {} already obfuscated, awaiting deletion", comment.id)
                    }
                }
                summary.no_op += 1;
            }
            LifecycleAction::Obfuscate(kind) => {
                let text = match render(&self.policy, &comment.body, self.generator.as_deref()).await
                {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Could not obfuscate comment {}: {}", comment.id, e);
                        summary.record_failure(&comment.id, FailureKind::Render, e);
                        return;
                    }
                };

                self.limiter.wait().await;
                match self.service.edit_comment(session, &comment.id, &text).await {
                    Ok(()) => {
                        info!(
                            "Obfuscated comment from {} with {}: {}",
                            comment.created_at, kind, comment.id
                        );
                        summary.obfuscated += 1;
                    }
                    Err(e) => {
                        warn!("Failed to update comment {}: {}", comment.id, e);
                        summary.record_failure(&comment.id, FailureKind::Mutation, e);
                    }
                }
            }
            LifecycleAction::Delete => {
                self.limiter.wait().await;
                match self.service.delete_comment(session, &comment.id).await {
                    Ok(()) => {
                        info!("Deleted comment from {}: {}", comment.created_at, comment.id);
                        summary.deleted += 1;
                    }
                    Err(e) => {
                        warn!("Failed to delete comment {}: {}", comment.id, e);
                        summary.record_failure(&comment.id, FailureKind::Mutation, e);
                    }
                }
            }
        }
    }
}
