use neo4rs::{ConfigBuilder, Graph};

use oeis_common::Config;

/// Bolt connection handle for the sequence graph.
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) graph: Graph,
}

impl GraphClient {
    /// Connect using the pipeline configuration. The connection pool is
    /// sized from the configured worker count; the batched write drain
    /// itself only ever holds one connection at a time.
    pub async fn connect(config: &Config) -> Result<Self, neo4rs::Error> {
        let bolt_config = ConfigBuilder::default()
            .uri(&config.neo4j_uri)
            .user(&config.neo4j_user)
            .password(&config.neo4j_password)
            .max_connections(pool_size(config.num_workers))
            .build()?;
        let graph = Graph::connect(bolt_config).await?;
        Ok(Self { graph })
    }
}

/// One connection per worker, with a floor of one.
fn pool_size(num_workers: usize) -> usize {
    num_workers.max(1)
}
