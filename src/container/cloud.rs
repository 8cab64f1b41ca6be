use crate::backend::CloudAccount;
use crate::errors::LifecycleResult;
use crate::logging::Logger;
use crate::schema::VersionedSchema;

/// Probes the cloud account and publishes schemas to it.
pub struct CloudManager {
    account: Box<dyn CloudAccount>,
    container: Option<String>,
    logger: Logger,
}

impl CloudManager {
    pub fn new(account: Box<dyn CloudAccount>, container: Option<String>, logger: &Logger) -> Self {
        Self {
            account,
            container,
            logger: logger.category("lifecycle.cloud"),
        }
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// Whether the store may sync. Configurations without a cloud
    /// container never do.
    pub fn check_availability(&self) -> bool {
        let Some(container) = self.container() else {
            self.logger.debug("No cloud container configured");
            return false;
        };
        let available = self.account.cloud_account_available();
        if available {
            self.logger.info(format!("Cloud account available for {container}"));
        } else {
            self.logger.warning(format!(
                "Cloud account unavailable for {container}, continuing locally"
            ));
        }
        available
    }

    pub fn initialize_schema(&self, schema: &VersionedSchema) -> LifecycleResult<()> {
        self.logger.info(format!("Pushing {} to the cloud", schema.version_string()));
        self.account.push_schema(schema).inspect_err(|e| {
            self.logger.error(format!(
                "Failed to push {}: {e}",
                schema.version_string()
            ));
        })
    }
}
