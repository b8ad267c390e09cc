//! Built-in directory content.
//!
//! Served by the storefront when no database is configured or the database
//! is unreachable, and inserted by `appy-cli seed` into a fresh database.

use crate::catalog::{Category, Discount, Provider};
use crate::types::{CategorySlug, ProviderId, ProviderTier};

struct SeedProvider {
    name: &'static str,
    category: &'static str,
    tags: &'static [&'static str],
    website: &'static str,
    summary: &'static str,
    details: &'static str,
    discount: Option<(&'static str, &'static str)>,
    featured: bool,
    tier: ProviderTier,
}

const CATEGORIES: &[(&str, &str)] = &[
    ("software", "Software & CRM"),
    ("sales", "Sales Solutions"),
    ("insurance", "Insurance"),
    ("equipment", "Equipment & Supplies"),
    ("vehicle_hire", "Vehicle Hire"),
    ("storage", "Storage"),
];

const PROVIDERS: &[SeedProvider] = &[
    SeedProvider {
        name: "MoveMan",
        category: "software",
        tags: &["crm", "quoting", "storage"],
        website: "https://www.movemanpro.com",
        summary: "UK removals CRM for quoting, planning and storage.",
        details: "Survey-to-invoice workflow built for removals firms, with crew planning, storage billing and customer portals.",
        discount: Some(("1 month free", "Free first month for Appy Link members.")),
        featured: true,
        tier: ProviderTier::Sponsor,
    },
    SeedProvider {
        name: "Moneypenny",
        category: "sales",
        tags: &["call answering", "live chat"],
        website: "https://www.moneypenny.com/uk",
        summary: "Call answering & live chat for removals firms.",
        details: "UK-based receptionists answer enquiries in your company name and book surveys straight into your diary.",
        discount: None,
        featured: true,
        tier: ProviderTier::Featured,
    },
    SeedProvider {
        name: "Basil Fry & Company",
        category: "insurance",
        tags: &["goods in transit", "storage"],
        website: "https://basilfry.co.uk",
        summary: "Specialist insurance for removals & storage.",
        details: "Goods in transit, storage and liability cover arranged by brokers who only work with the moving trade.",
        discount: None,
        featured: true,
        tier: ProviderTier::Featured,
    },
    SeedProvider {
        name: "Removals Manager",
        category: "software",
        tags: &["crm", "scheduling"],
        website: "https://www.removalsmanager.com",
        summary: "Cloud job management for small and mid-size movers.",
        details: "Quotes, diary, invoicing and online surveys in one subscription with UK support.",
        discount: Some(("10% off first year", "Quote APPYLINK when signing up.")),
        featured: false,
        tier: ProviderTier::Free,
    },
    SeedProvider {
        name: "Survey Snap",
        category: "software",
        tags: &["surveys", "video"],
        website: "https://surveysnap.example.com",
        summary: "Video surveys customers can record on their phone.",
        details: "Customers walk through their home on camera; the app produces an inventory and volume estimate.",
        discount: None,
        featured: false,
        tier: ProviderTier::Free,
    },
    SeedProvider {
        name: "Lead Lane",
        category: "sales",
        tags: &["leads", "marketing"],
        website: "https://leadlane.example.com",
        summary: "Pay-per-lead removal enquiries across the UK.",
        details: "Verified home and office removal leads filtered by postcode and move size.",
        discount: Some(("First 5 leads free", "")),
        featured: false,
        tier: ProviderTier::Free,
    },
    SeedProvider {
        name: "Shield Cover Direct",
        category: "insurance",
        tags: &["liability", "fleet"],
        website: "https://shieldcover.example.com",
        summary: "Fleet and public liability policies for removal companies.",
        details: "Monthly-payment fleet policies with courtesy vans and a 24 hour claims line.",
        discount: None,
        featured: false,
        tier: ProviderTier::Free,
    },
    SeedProvider {
        name: "BoxCo Packaging",
        category: "equipment",
        tags: &["boxes", "packaging"],
        website: "https://boxco.example.com",
        summary: "Removal boxes, tape and wrap delivered next day.",
        details: "Double-wall cartons, wardrobe boxes, bubble wrap and mattress covers at trade prices.",
        discount: Some(("15% trade discount", "Applied automatically to trade accounts.")),
        featured: false,
        tier: ProviderTier::Free,
    },
    SeedProvider {
        name: "Dolly & Strap",
        category: "equipment",
        tags: &["equipment", "blankets"],
        website: "https://dollyandstrap.example.com",
        summary: "Dollies, straps, blankets and piano skids.",
        details: "Heavy-duty handling kit tested by working crews, with bulk pricing for fleets.",
        discount: None,
        featured: false,
        tier: ProviderTier::Free,
    },
    SeedProvider {
        name: "Luton Van Hire UK",
        category: "vehicle_hire",
        tags: &["vans", "luton"],
        website: "https://lutonvanhire.example.com",
        summary: "Short-term Luton and 7.5t hire for peak season.",
        details: "Tail-lift Lutons and 7.5 tonne boxes from depots across England and Wales.",
        discount: None,
        featured: false,
        tier: ProviderTier::Free,
    },
    SeedProvider {
        name: "FleetFlex",
        category: "vehicle_hire",
        tags: &["vans", "leasing"],
        website: "https://fleetflex.example.com",
        summary: "Flexible lease on removal trucks with maintenance included.",
        details: "Monthly rolling contracts, replacement vehicles and livery service.",
        discount: Some(("No setup fee", "")),
        featured: false,
        tier: ProviderTier::Free,
    },
    SeedProvider {
        name: "ContainerStore Pro",
        category: "storage",
        tags: &["containers", "storage"],
        website: "https://containerstore.example.com",
        summary: "Wooden storage containers built to order.",
        details: "Stackable 250 cu ft containers with forklift pockets, supplied flat-packed or assembled.",
        discount: None,
        featured: false,
        tier: ProviderTier::Free,
    },
    SeedProvider {
        name: "Vault Self Storage Partners",
        category: "storage",
        tags: &["self storage", "partners"],
        website: "https://vaultpartners.example.com",
        summary: "Refer customers to self storage and earn commission.",
        details: "Partner network of self storage sites paying referral fees to removals firms.",
        discount: None,
        featured: false,
        tier: ProviderTier::Free,
    },
    SeedProvider {
        name: "Old Depot Supplies",
        category: "equipment",
        tags: &["boxes"],
        website: "https://olddepot.example.com",
        summary: "Closing down; listing kept for reference.",
        details: "",
        discount: None,
        featured: false,
        tier: ProviderTier::Free,
    },
];

/// Names of seed providers that are hidden from the public directory.
const INACTIVE: &[&str] = &["Old Depot Supplies"];

/// Seed categories in display order.
#[must_use]
pub fn categories() -> Vec<Category> {
    CATEGORIES
        .iter()
        .zip(1..)
        .filter_map(|(&(id, label), sort_order)| {
            Some(Category {
                id: CategorySlug::parse(id).ok()?,
                label: label.to_owned(),
                sort_order,
            })
        })
        .collect()
}

/// Seed providers with ids starting at 1.
#[must_use]
pub fn providers() -> Vec<Provider> {
    PROVIDERS
        .iter()
        .zip(1..)
        .filter_map(|(p, id)| {
            Some(Provider {
                id: ProviderId::new(id),
                name: p.name.to_owned(),
                category: CategorySlug::parse(p.category).ok()?,
                tags: p.tags.iter().map(|&t| t.to_owned()).collect(),
                website: Some(p.website.to_owned()),
                summary: p.summary.to_owned(),
                details: p.details.to_owned(),
                discount: p.discount.map(|(label, details)| Discount {
                    label: label.to_owned(),
                    details: (!details.is_empty()).then(|| details.to_owned()),
                }),
                logo_url: None,
                is_active: !INACTIVE.contains(&p.name),
                is_featured: p.featured,
                featured_until: None,
                tier: p.tier,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_seed_is_consistent() {
        let categories = categories();
        let providers = providers();
        assert_eq!(categories.len(), CATEGORIES.len());
        assert_eq!(providers.len(), PROVIDERS.len());

        for p in &providers {
            assert!(
                categories.iter().any(|c| c.id == p.category),
                "{} has unknown category",
                p.name
            );
        }

        let names: HashSet<_> = providers.iter().map(|p| p.name.to_lowercase()).collect();
        assert_eq!(names.len(), providers.len(), "provider names must be unique");
    }

    #[test]
    fn test_seed_fills_more_than_one_page() {
        let active = providers().iter().filter(|p| p.is_active).count();
        assert!(active > crate::directory::PAGE_SIZE);
    }
}
