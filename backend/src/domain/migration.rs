//! One-time structural fixup of dogs that still carry embedded owner
//! fields from before the customer registry existed.
//!
//! The transform is pure and combined: it produces the new customer list
//! and the new dog list together, so the caller can persist both in a
//! single write and a crash can never leave a dog referencing a customer
//! that was never stored.

use shared::{Customer, Dog};

/// Result of applying the owner migration to a document's registry
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub customers: Vec<Customer>,
    pub dogs: Vec<Dog>,
    /// Number of dogs that were rewritten
    pub migrated: usize,
}

/// Rewrite every dog carrying a legacy owner field: synthesize a customer
/// from the embedded name/phone, point the dog at it, and drop the legacy
/// fields. Dogs without legacy fields pass through unchanged.
///
/// Returns `None` when no dog needs migrating, which also makes a second
/// application a no-op.
pub fn migrate_legacy_owners(
    customers: &[Customer],
    dogs: &[Dog],
    now: &str,
) -> Option<MigrationOutcome> {
    if !dogs.iter().any(Dog::has_legacy_owner) {
        return None;
    }

    let mut new_customers = customers.to_vec();
    let mut migrated = 0;

    let new_dogs = dogs
        .iter()
        .cloned()
        .map(|mut dog| {
            if !dog.has_legacy_owner() {
                return dog;
            }

            let customer_id = Customer::generate_id();
            let name = dog
                .owner_name
                .take()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unknown Owner".to_string());
            let phone = dog.owner_phone.take().unwrap_or_default();

            new_customers.push(Customer {
                id: customer_id.clone(),
                name,
                phone,
                email: String::new(),
                address: String::new(),
                created_at: now.to_string(),
            });

            dog.customer_id = Some(customer_id);
            migrated += 1;
            dog
        })
        .collect();

    Some(MigrationOutcome {
        customers: new_customers,
        dogs: new_dogs,
        migrated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_dog(id: &str, name: &str) -> Dog {
        Dog {
            id: id.to_string(),
            name: name.to_string(),
            daily_price: 450.0,
            customer_id: None,
            vet_phone: String::new(),
            birthday: String::new(),
            notes: String::new(),
            photo_url: None,
            owner_name: None,
            owner_phone: None,
            created_at: "2024-02-26T08:00:00Z".to_string(),
        }
    }

    fn legacy_dog(id: &str, name: &str, owner: &str, phone: &str) -> Dog {
        Dog {
            owner_name: Some(owner.to_string()),
            owner_phone: Some(phone.to_string()),
            ..plain_dog(id, name)
        }
    }

    #[test]
    fn test_legacy_dog_gets_synthesized_customer() {
        let dogs = vec![legacy_dog("d1", "Buddy", "Anna", "070-1")];

        let outcome =
            migrate_legacy_owners(&[], &dogs, "2024-02-26T08:00:00Z").expect("Should migrate");

        assert_eq!(outcome.migrated, 1);
        assert_eq!(outcome.customers.len(), 1);
        let customer = &outcome.customers[0];
        assert_eq!(customer.name, "Anna");
        assert_eq!(customer.phone, "070-1");

        let dog = &outcome.dogs[0];
        assert_eq!(dog.customer_id.as_deref(), Some(customer.id.as_str()));
        assert_eq!(dog.owner_name, None);
        assert_eq!(dog.owner_phone, None);
    }

    #[test]
    fn test_missing_owner_name_falls_back() {
        let mut dog = plain_dog("d1", "Buddy");
        dog.owner_phone = Some("070-2".to_string());

        let outcome =
            migrate_legacy_owners(&[], &[dog], "2024-02-26T08:00:00Z").expect("Should migrate");

        assert_eq!(outcome.customers[0].name, "Unknown Owner");
        assert_eq!(outcome.customers[0].phone, "070-2");
    }

    #[test]
    fn test_clean_dogs_pass_through_unchanged() {
        let dogs = vec![plain_dog("d1", "Buddy"), plain_dog("d2", "Ludde")];

        assert!(migrate_legacy_owners(&[], &dogs, "2024-02-26T08:00:00Z").is_none());
    }

    #[test]
    fn test_mixed_list_preserves_order_and_existing_customers() {
        let existing = vec![Customer {
            id: "c1".to_string(),
            name: "Berit".to_string(),
            phone: "070-0".to_string(),
            email: String::new(),
            address: String::new(),
            created_at: "2024-01-01T08:00:00Z".to_string(),
        }];
        let dogs = vec![
            plain_dog("d1", "Buddy"),
            legacy_dog("d2", "Ludde", "Anna", "070-1"),
            plain_dog("d3", "Zorro"),
        ];

        let outcome = migrate_legacy_owners(&existing, &dogs, "2024-02-26T08:00:00Z")
            .expect("Should migrate");

        assert_eq!(outcome.migrated, 1);
        // Existing customers keep their position, synthesized ones append
        assert_eq!(outcome.customers[0].id, "c1");
        assert_eq!(outcome.customers.len(), 2);
        // Dog order is untouched
        let ids: Vec<&str> = outcome.dogs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["d1", "d2", "d3"]);
        assert_eq!(outcome.dogs[0].customer_id, None);
    }

    #[test]
    fn test_migration_is_idempotent() {
        let dogs = vec![legacy_dog("d1", "Buddy", "Anna", "070-1")];
        let outcome =
            migrate_legacy_owners(&[], &dogs, "2024-02-26T08:00:00Z").expect("Should migrate");

        // A second pass over the migrated data finds nothing to do
        assert!(migrate_legacy_owners(
            &outcome.customers,
            &outcome.dogs,
            "2024-02-27T08:00:00Z"
        )
        .is_none());
    }
}
