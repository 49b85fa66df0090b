use async_trait::async_trait;
use domain::{Comment, GenerationError, ServiceError};

/// 远端评论服务：认证、列出本人评论、编辑与删除
#[async_trait]
pub trait RemoteContentService: Send + Sync {
    type Session: Send + Sync;

    async fn authenticate(&self) -> Result<Self::Session, ServiceError>;

    async fn list_own_comments(
        &self,
        session: &Self::Session,
        limit: usize,
    ) -> Result<Vec<Comment>, ServiceError>;

    async fn edit_comment(
        &self,
        session: &Self::Session,
        id: &str,
        new_body: &str,
    ) -> Result<(), ServiceError>;

    async fn delete_comment(&self, session: &Self::Session, id: &str) -> Result<(), ServiceError>;
}

/// 生成式文本后端，仅 generate 策略使用
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, GenerationError>;
}
