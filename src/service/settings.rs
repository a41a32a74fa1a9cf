//! Invoice settings, company profile and general preferences.

use super::DealerService;
use crate::backend::StoreBackend;
use crate::error::Result;
use crate::key::StoreKey;
use crate::models::{CompanyProfile, GeneralSettings, InvoiceSettings};

impl<B: StoreBackend> DealerService<B> {
    /// Current invoice settings, defaults when never saved.
    pub async fn get_invoice_settings(&self) -> Result<InvoiceSettings> {
        self.inner.store.load_invoice_settings().await
    }

    /// Replace the invoice settings, counters included.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` for an over-long prefix or a counter
    /// below 1.
    pub async fn save_invoice_settings(&self, settings: &InvoiceSettings) -> Result<()> {
        settings.validate()?;
        self.inner
            .store
            .save(StoreKey::InvoiceSettings, settings)
            .await?;
        info!(
            "✓ Invoice settings saved (next {} / {})",
            crate::serial::peek_next_serial(true, settings),
            crate::serial::peek_next_serial(false, settings)
        );
        Ok(())
    }

    /// The company profile, `None` until one is saved.
    pub async fn get_company_profile(&self) -> Result<Option<CompanyProfile>> {
        self.inner.store.load_company_profile().await
    }

    /// # Errors
    ///
    /// Returns `Error::ValidationError` when a required field is missing or
    /// malformed.
    pub async fn save_company_profile(&self, profile: &CompanyProfile) -> Result<()> {
        profile.validate()?;
        self.inner
            .store
            .save(StoreKey::CompanyProfile, profile)
            .await?;
        info!("✓ Company profile saved for {}", profile.company_name);
        Ok(())
    }

    pub async fn get_general_settings(&self) -> Result<GeneralSettings> {
        self.inner.store.load_general_settings().await
    }

    /// # Errors
    ///
    /// Returns `Error::ValidationError` if items per page is outside 5..=100.
    pub async fn save_general_settings(&self, settings: &GeneralSettings) -> Result<()> {
        settings.validate()?;
        self.inner
            .store
            .save(StoreKey::GeneralSettings, settings)
            .await?;
        info!(
            "✓ General settings saved (theme {}, {} per page)",
            settings.theme, settings.default_items_per_page
        );
        Ok(())
    }
}
