//! Idempotent seeding of the developer and area catalogue.
//!
//! Rows are keyed by slug. Existing slugs are left untouched and logged as
//! skipped, so running the seed any number of times yields one row per slug.

use crate::db::models::{NewArea, NewDeveloper};
use crate::schema;
use diesel::prelude::*;
use diesel::PgConnection;
use log::info;
use std::collections::BTreeSet;

struct DeveloperSeed {
    slug: &'static str,
    name: &'static str,
    description: &'static str,
    website: &'static str,
    founded_year: i32,
}

struct AreaSeed {
    slug: &'static str,
    name: &'static str,
    starting_price: &'static str,
    description: &'static str,
}

const DEVELOPERS: [DeveloperSeed; 8] = [
    DeveloperSeed {
        slug: "emaar",
        name: "Emaar Properties",
        description: "Master developer behind Downtown Dubai, Dubai Hills Estate and Dubai Creek Harbour.",
        website: "https://www.emaar.com",
        founded_year: 1997,
    },
    DeveloperSeed {
        slug: "damac",
        name: "DAMAC Properties",
        description: "Luxury residential developer with branded towers and golf communities.",
        website: "https://www.damacproperties.com",
        founded_year: 2002,
    },
    DeveloperSeed {
        slug: "sobha",
        name: "Sobha Realty",
        description: "Backward-integrated developer known for Sobha Hartland in MBR City.",
        website: "https://www.sobharealty.com",
        founded_year: 1976,
    },
    DeveloperSeed {
        slug: "nakheel",
        name: "Nakheel",
        description: "Government-backed developer of Palm Jumeirah and the Dubai Islands.",
        website: "https://www.nakheel.com",
        founded_year: 2000,
    },
    DeveloperSeed {
        slug: "meraas",
        name: "Meraas",
        description: "Lifestyle developer behind Bluewaters, City Walk and La Mer.",
        website: "https://www.meraas.com",
        founded_year: 2007,
    },
    DeveloperSeed {
        slug: "ellington",
        name: "Ellington Properties",
        description: "Design-led boutique developer across JVC, Downtown and MBR City.",
        website: "https://www.ellingtonproperties.ae",
        founded_year: 2014,
    },
    DeveloperSeed {
        slug: "binghatti",
        name: "Binghatti Developers",
        description: "Developer of distinctive facades in Business Bay and JVC.",
        website: "https://www.binghatti.com",
        founded_year: 2008,
    },
    DeveloperSeed {
        slug: "azizi",
        name: "Azizi Developments",
        description: "High-volume developer of Riviera in MBR City and Azizi Venice.",
        website: "https://www.azizidevelopments.com",
        founded_year: 2007,
    },
];

const AREAS: [AreaSeed; 8] = [
    AreaSeed {
        slug: "dubai-marina",
        name: "Dubai Marina",
        starting_price: "AED 1.2M",
        description: "Waterfront towers along a 3km canal with beach access.",
    },
    AreaSeed {
        slug: "downtown-dubai",
        name: "Downtown Dubai",
        starting_price: "AED 1.8M",
        description: "Home of Burj Khalifa and The Dubai Mall.",
    },
    AreaSeed {
        slug: "business-bay",
        name: "Business Bay",
        starting_price: "AED 950K",
        description: "Mixed-use district along the Dubai Water Canal.",
    },
    AreaSeed {
        slug: "palm-jumeirah",
        name: "Palm Jumeirah",
        starting_price: "AED 2.5M",
        description: "Man-made island of beachfront villas and residences.",
    },
    AreaSeed {
        slug: "jumeirah-village-circle",
        name: "Jumeirah Village Circle",
        starting_price: "AED 650K",
        description: "Family community with some of the city's strongest rental yields.",
    },
    AreaSeed {
        slug: "dubai-hills-estate",
        name: "Dubai Hills Estate",
        starting_price: "AED 1.5M",
        description: "Green master community around an 18-hole golf course.",
    },
    AreaSeed {
        slug: "dubai-creek-harbour",
        name: "Dubai Creek Harbour",
        starting_price: "AED 1.3M",
        description: "Waterfront district beside the Ras Al Khor wildlife sanctuary.",
    },
    AreaSeed {
        slug: "mohammed-bin-rashid-city",
        name: "Mohammed Bin Rashid City",
        starting_price: "AED 1.1M",
        description: "Large master plan including Sobha Hartland and District One.",
    },
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

pub fn run(conn: &mut PgConnection) -> Result<(), String> {
    let developers = seed_developers(conn)?;
    info!(
        "Seed: developers inserted={}, skipped={}",
        developers.inserted, developers.skipped
    );
    let areas = seed_areas(conn)?;
    info!("Seed: areas inserted={}, skipped={}", areas.inserted, areas.skipped);
    Ok(())
}

/// Decide, per candidate slug, whether it should be inserted. Slugs already in
/// `existing`, and repeats within `candidates`, are skipped.
fn plan_inserts<'a>(candidates: impl IntoIterator<Item = &'a str>, existing: &BTreeSet<String>) -> Vec<bool> {
    let mut seen = BTreeSet::new();
    candidates
        .into_iter()
        .map(|slug| !existing.contains(slug) && seen.insert(slug))
        .collect()
}

fn seed_developers(conn: &mut PgConnection) -> Result<SeedReport, String> {
    use schema::developers::dsl as D;

    let existing: BTreeSet<String> = D::developers
        .select(D::slug)
        .load::<String>(conn)
        .map_err(|e| format!("load developer slugs failed: {}", e))?
        .into_iter()
        .collect();

    let mut report = SeedReport::default();
    let plan = plan_inserts(DEVELOPERS.iter().map(|d| d.slug), &existing);
    for (seed, insert) in DEVELOPERS.iter().zip(plan) {
        if !insert {
            info!("Developer {} already exists, skipping", seed.slug);
            report.skipped += 1;
            continue;
        }
        let row = NewDeveloper {
            slug: seed.slug.to_string(),
            name: seed.name.to_string(),
            description: Some(seed.description.to_string()),
            logo: Some(format!("/images/developers/{}.png", seed.slug)),
            website: Some(seed.website.to_string()),
            founded_year: Some(seed.founded_year),
            headquarters: Some("Dubai, UAE".to_string()),
        };
        // A concurrent seed may have won the race since the slugs were loaded.
        let inserted = diesel::insert_into(D::developers)
            .values(&row)
            .on_conflict(D::slug)
            .do_nothing()
            .execute(conn)
            .map_err(|e| format!("insert developer {} failed: {}", seed.slug, e))?;
        if inserted == 0 {
            info!("Developer {} already exists, skipping", seed.slug);
            report.skipped += 1;
        } else {
            info!("Developer {} created", seed.slug);
            report.inserted += 1;
        }
    }
    Ok(report)
}

fn seed_areas(conn: &mut PgConnection) -> Result<SeedReport, String> {
    use schema::areas::dsl as A;

    let existing: BTreeSet<String> = A::areas
        .select(A::slug)
        .load::<String>(conn)
        .map_err(|e| format!("load area slugs failed: {}", e))?
        .into_iter()
        .collect();

    let mut report = SeedReport::default();
    let plan = plan_inserts(AREAS.iter().map(|a| a.slug), &existing);
    for (seed, insert) in AREAS.iter().zip(plan) {
        if !insert {
            info!("Area {} already exists, skipping", seed.slug);
            report.skipped += 1;
            continue;
        }
        let row = NewArea {
            slug: seed.slug.to_string(),
            name: seed.name.to_string(),
            image: Some(format!("/images/areas/{}.jpg", seed.slug)),
            starting_price: Some(seed.starting_price.to_string()),
            description: Some(seed.description.to_string()),
        };
        let inserted = diesel::insert_into(A::areas)
            .values(&row)
            .on_conflict(A::slug)
            .do_nothing()
            .execute(conn)
            .map_err(|e| format!("insert area {} failed: {}", seed.slug, e))?;
        if inserted == 0 {
            info!("Area {} already exists, skipping", seed.slug);
            report.skipped += 1;
        } else {
            info!("Area {} created", seed.slug);
            report.inserted += 1;
        }
    }
    Ok(report)
}
