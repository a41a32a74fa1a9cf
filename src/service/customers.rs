//! Customer (party) management.

use super::DealerService;
use crate::backend::StoreBackend;
use crate::entity::{self, new_id, Record};
use crate::error::{Error, Result};
use crate::key::StoreKey;
use crate::models::{Customer, CustomerForm};
use chrono::Utc;

impl<B: StoreBackend> DealerService<B> {
    /// All customers in stored order.
    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        self.inner.store.load_collection().await
    }

    /// # Errors
    ///
    /// Returns `Error::NotFound` if no customer has this id.
    pub async fn get_customer(&self, id: &str) -> Result<Customer> {
        let customers: Vec<Customer> = self.list_customers().await?;
        entity::find(&customers, id)
            .cloned()
            .ok_or_else(|| Error::not_found(Customer::kind(), id))
    }

    /// Add a customer. Registration status follows the GST number.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` for a bad form, or a storage error.
    pub async fn create_customer(&self, form: CustomerForm) -> Result<Customer> {
        form.validate()?;
        let mut customers: Vec<Customer> = self.list_customers().await?;

        let now = Utc::now();
        let customer = Customer {
            id: new_id(),
            details: form.into_details(),
            created_at: now,
            updated_at: now,
        };
        customers.push(customer.clone());
        self.inner.store.save(StoreKey::Customers, &customers).await?;

        info!(
            "✓ Customer {} created ({})",
            customer.details.customer_name,
            if customer.is_registered() {
                "registered"
            } else {
                "non-registered"
            }
        );
        Ok(customer)
    }

    /// Replace a customer's fields. Invoices keep the snapshot they were
    /// saved with.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` for a bad form or `Error::NotFound`
    /// for an unknown id.
    pub async fn update_customer(&self, id: &str, form: CustomerForm) -> Result<Customer> {
        form.validate()?;
        let mut customers: Vec<Customer> = self.list_customers().await?;
        let index = entity::position(&customers, id)
            .ok_or_else(|| Error::not_found(Customer::kind(), id))?;

        let existing = &customers[index];
        let customer = Customer {
            id: existing.id.clone(),
            details: form.into_details(),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        customers[index] = customer.clone();
        self.inner.store.save(StoreKey::Customers, &customers).await?;

        info!("✓ Customer {} updated", customer.details.customer_name);
        Ok(customer)
    }

    /// Remove a customer.
    ///
    /// Invoices and purchases that reference the customer keep their
    /// snapshots; nothing else is touched.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown id.
    pub async fn delete_customer(&self, id: &str) -> Result<()> {
        let mut customers: Vec<Customer> = self.list_customers().await?;
        let index = entity::position(&customers, id)
            .ok_or_else(|| Error::not_found(Customer::kind(), id))?;

        let removed = customers.remove(index);
        self.inner.store.save(StoreKey::Customers, &customers).await?;

        info!("✓ Customer {} deleted", removed.details.customer_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::InMemoryBackend;
    use crate::error::Error;
    use crate::fixtures::customer_form;
    use crate::models::CustomerForm;
    use crate::DealerService;

    #[tokio::test]
    async fn test_customer_crud() {
        let ledger = DealerService::new(InMemoryBackend::new());

        let created = ledger
            .create_customer(customer_form("Uttar Pradesh"))
            .await
            .expect("Failed to create customer");
        assert!(!created.is_registered());

        let updated = ledger
            .update_customer(
                &created.id,
                CustomerForm {
                    gst_no: Some("09AABCU9603R1ZM".into()),
                    ..customer_form("Uttar Pradesh")
                },
            )
            .await
            .expect("Failed to update customer");
        assert!(updated.is_registered());
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(
            ledger
                .get_customer(&created.id)
                .await
                .expect("Failed to get customer"),
            updated
        );

        ledger
            .delete_customer(&created.id)
            .await
            .expect("Failed to delete customer");
        assert!(ledger
            .list_customers()
            .await
            .expect("Failed to list")
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let ledger = DealerService::new(InMemoryBackend::new());
        let result = ledger.delete_customer("missing").await;
        assert!(matches!(result, Err(Error::NotFound { kind: "customer", .. })));
    }

    #[tokio::test]
    async fn test_invalid_form_writes_nothing() {
        let backend = InMemoryBackend::new();
        let ledger = DealerService::new(backend.clone());
        let result = ledger
            .create_customer(CustomerForm {
                mobile_no: "123".into(),
                ..customer_form("Bihar")
            })
            .await;

        assert!(matches!(result, Err(Error::ValidationError(_))));
        assert!(backend.is_empty().await);
    }
}
