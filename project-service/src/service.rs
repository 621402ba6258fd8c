//! 列表查询服务模块

use std::sync::Arc;

use common::errors::AppResult;
use common::models::{map_rows, Comment, FromRawRow, Project};
use common::response::{timed, Envelope};

use crate::executor::{EmptyPolicy, FixedQuery, QueryExecutor};

/// Runs a fixed query, maps its rows and wraps them in a timed envelope.
pub struct ListingService {
    executor: Arc<dyn QueryExecutor>,
    empty_policy: EmptyPolicy,
}

impl ListingService {
    /// 创建新的列表服务实例，空结果视为失败
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            empty_policy: EmptyPolicy::default(),
        }
    }

    pub fn with_empty_policy(mut self, policy: EmptyPolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    /// 查询全部项目
    pub async fn projects(&self) -> AppResult<Envelope<Project>> {
        timed(self.fetch(FixedQuery::Projects)).await
    }

    /// 查询全部评论
    pub async fn comments(&self) -> AppResult<Envelope<Comment>> {
        timed(self.fetch(FixedQuery::Comments)).await
    }

    async fn fetch<T: FromRawRow>(&self, query: FixedQuery) -> AppResult<Vec<T>> {
        let rows = self
            .executor
            .execute(query)
            .await?
            .into_rows(self.empty_policy)?;
        let records = map_rows(&rows)?;
        tracing::info!(query = query.name(), count = rows.len(), "listing fetched");
        Ok(records)
    }
}
