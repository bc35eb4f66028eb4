//! Backend listing.

use peroot::{BackendCatalog, Credentials, PerootConfig};

/// Print each catalog entry with its fallback position and availability.
pub fn list_backends(config: &PerootConfig, credentials: &Credentials) {
    let catalog = BackendCatalog::builtin();
    let order = &config.gateway.fallback_order;

    println!(
        "{:<4} {:<18} {:<30} {:<10} {:<18} {}",
        "#", "ID", "LABEL", "FAMILY", "MODEL", "STATUS"
    );

    for descriptor in catalog.iter() {
        let position = order
            .iter()
            .position(|id| id == descriptor.id())
            .map(|i| (i + 1).to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = descriptor
            .availability(credentials)
            .reason()
            .unwrap_or_else(|| "available".to_string());

        println!(
            "{:<4} {:<18} {:<30} {:<10} {:<18} {}",
            position,
            descriptor.id(),
            descriptor.label(),
            descriptor.family(),
            descriptor.model(),
            status
        );
    }

    for id in order.unresolved(&catalog) {
        println!("{:<4} {:<18} not in catalog", "?", id);
    }
}
