//! Query assembly.

use crate::blockchain::state::StateSource;
use crate::query::codec::{encode_query, query_hash};
use crate::query::response::ResponseTree;
use crate::query::types::{
    AssembledQuery, FragmentRequest, QueryError, QueryFragment, QueryResult, MAX_QUERY_FRAGMENTS,
};

/// Accumulates fragments in append order.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    fragments: Vec<QueryFragment>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append one fragment.
    pub fn append(&mut self, request: FragmentRequest) -> QueryResult<&mut Self> {
        if self.fragments.len() >= MAX_QUERY_FRAGMENTS {
            return Err(QueryError::QueryTooLarge {
                max: MAX_QUERY_FRAGMENTS,
            });
        }
        let fragment = QueryFragment::try_from(request)?;
        self.fragments.push(fragment);
        Ok(self)
    }

    pub fn fragments(&self) -> &[QueryFragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Encode the query and compute its response hash from chain state.
    pub async fn build<S: StateSource>(&self, state: &S) -> QueryResult<AssembledQuery> {
        if self.fragments.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let encoded_query = encode_query(&self.fragments);
        let query_hash = query_hash(&encoded_query);
        let tree = ResponseTree::collect(&self.fragments, state).await?;

        tracing::info!(
            fragments = self.fragments.len(),
            query_hash = %query_hash,
            response_hash = %tree.keccak_query_response(),
            "Query assembled"
        );

        Ok(AssembledQuery {
            response_hash: tree.keccak_query_response(),
            query_hash,
            encoded_query,
        })
    }
}
