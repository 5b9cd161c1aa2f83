//! Consumer handler

use tracing::{info, instrument};

use super::BuilderFactory;
use crate::domain::{Consumer, Gateway, Realm};
use crate::errors::{GatewayError, Result, ResultExt};
use crate::features::consumer_features;

pub struct ConsumerHandler<F: BuilderFactory> {
    factory: F,
}

impl<F: BuilderFactory> ConsumerHandler<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Synchronize `consumer` and return it with its status updated
    #[instrument(skip_all, fields(consumer = %consumer.name), name = "consumer_create_or_update")]
    pub async fn create_or_update(
        &self,
        consumer: Consumer,
        realm: Realm,
        gateway: Gateway,
    ) -> Result<Consumer> {
        let mut builder = self.factory.consumer_builder(consumer, realm, gateway);
        for feature in consumer_features() {
            builder.enable_feature(feature);
        }

        builder.build_for_consumer().await.context("failed to build consumer")?;

        info!("consumer processed successfully");
        builder.into_consumer().ok_or(GatewayError::NoConsumer)
    }

    #[instrument(skip_all, fields(consumer = %consumer.name), name = "consumer_delete")]
    pub async fn delete(&self, consumer: &Consumer) -> Result<()> {
        self.factory.admin().delete_consumer(consumer).await.context("failed to delete consumer")?;
        info!("consumer deleted");
        Ok(())
    }
}
