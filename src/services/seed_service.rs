use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::auth::hash_password;
use crate::database::models::role::ROLE_USER;
use crate::database::models::{Certificate, Tag, User};

use super::{CertificateService, ServiceError, TagService, UserService};

const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brave", "calm", "clever", "crimson", "daring", "eager", "fancy", "gentle",
    "golden", "happy", "jolly", "kind", "lively", "lucky", "mellow", "merry", "nimble", "proud",
    "quiet", "rapid", "silent", "silver", "sunny", "swift", "tender", "vivid", "witty", "zesty",
];

const NOUNS: &[&str] = &[
    "badger", "beacon", "canyon", "comet", "falcon", "forest", "garden", "harbor", "island", "lagoon",
    "lantern", "meadow", "nebula", "orchid", "otter", "panda", "pebble", "prairie", "raven", "river",
    "sparrow", "summit", "thunder", "tiger", "valley", "violet", "walrus", "willow", "zephyr", "meteor",
];

/// `adjective_noun` names, unique within one generator
pub struct NameGenerator<R: Rng> {
    rng: R,
    used: HashSet<String>,
}

impl NameGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> NameGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, used: HashSet::new() }
    }

    pub fn next_name(&mut self) -> String {
        let adjective = ADJECTIVES.choose(&mut self.rng).copied().unwrap_or("plain");
        let noun = NOUNS.choose(&mut self.rng).copied().unwrap_or("name");
        let base = format!("{}_{}", adjective, noun);

        let mut name = base.clone();
        let mut suffix = 1;
        while self.used.contains(&name) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }
        self.used.insert(name.clone());
        name
    }

    /// `round(rand(1..100) * 1.55, 2)`
    pub fn price(&mut self) -> Decimal {
        let units: i64 = self.rng.gen_range(1..100);
        (Decimal::from(units) * Decimal::new(155, 2)).round_dp(2)
    }

    /// Days, 1..10
    pub fn duration(&mut self) -> i32 {
        self.rng.gen_range(1..10)
    }
}

/// "word_word" -> "Word word"
pub fn capitalize(word: &str) -> String {
    let spaced = word.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "[Kind] Word word"
pub fn with_prefix(prefix: &str, word: &str) -> String {
    format!("[{}] {}", prefix, capitalize(word))
}

pub struct SeedService {
    pool: PgPool,
}

/// Rows created by one generation run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub tags: u32,
    pub certificates: u32,
    pub users: u32,
    pub orders: u32,
}

impl SeedService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create `records` tags, certificates, users and orders in one transaction.
    /// Each certificate carries its own tag and the previous iteration's tag;
    /// each user orders the certificate of the same iteration.
    pub async fn generate(&self, records: u32) -> Result<SeedSummary, ServiceError> {
        info!("Generating entities for {} records each", records);
        let mut names = NameGenerator::from_entropy();
        let mut summary = SeedSummary::default();
        let mut previous_tag: Option<Tag> = None;

        let mut tx = self.pool.begin().await?;

        for i in 0..records {
            let tag_name = with_prefix("Tag", &names.next_name());
            let tag = TagService::find_or_create(&mut tx, &[tag_name]).await?.pop()
                .ok_or_else(|| ServiceError::validation("tag", "could not be created"))?;
            summary.tags += 1;

            let certificate = sqlx::query_as::<_, Certificate>(
                "INSERT INTO gift_certificate (name, description, price, duration) \
                 VALUES ($1, $2, $3, $4) RETURNING *",
            )
            .bind(with_prefix("GiftCertificate", &names.next_name()))
            .bind(capitalize(&names.next_name()))
            .bind(names.price())
            .bind(names.duration())
            .fetch_one(&mut *tx)
            .await?;

            let mut tag_names = vec![tag.name.clone()];
            if let Some(previous) = &previous_tag {
                tag_names.push(previous.name.clone());
            }
            CertificateService::replace_tags(&mut tx, certificate.id, &tag_names).await?;
            previous_tag = Some(tag);
            summary.certificates += 1;

            let user = self.insert_user(&mut tx, &mut names).await?;
            UserService::set_roles(&mut tx, user.id, &[ROLE_USER.to_string()]).await?;
            summary.users += 1;

            sqlx::query("INSERT INTO cert_order (price, customer_id, cert_id) VALUES ($1, $2, $3)")
                .bind(certificate.price)
                .bind(user.id)
                .bind(certificate.id)
                .execute(&mut *tx)
                .await?;
            summary.orders += 1;

            debug!("Generated record {} of {}", i + 1, records);
        }

        tx.commit().await?;

        info!("Generated entities finished: {:?}", summary);
        Ok(summary)
    }

    /// Password equals the username; names already in the database are skipped
    async fn insert_user(
        &self,
        conn: &mut sqlx::PgConnection,
        names: &mut NameGenerator<StdRng>,
    ) -> Result<User, ServiceError> {
        loop {
            let name = names.next_name();
            let password_hash = hash_password(&name)?;
            let user = sqlx::query_as::<_, User>(
                "INSERT INTO customer (name, email, username, password) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT DO NOTHING RETURNING *",
            )
            .bind(with_prefix("User", &name))
            .bind(format!("{}@mail.com", name))
            .bind(&name)
            .bind(password_hash)
            .fetch_optional(&mut *conn)
            .await?;

            if let Some(user) = user {
                return Ok(user);
            }
            debug!("User name {} already taken, generating another", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> NameGenerator<StdRng> {
        NameGenerator::new(StdRng::seed_from_u64(7))
    }

    #[test]
    fn names_are_unique_within_a_run() {
        let mut names = generator();
        let generated: Vec<String> = (0..2000).map(|_| names.next_name()).collect();
        let unique: HashSet<&String> = generated.iter().collect();
        assert_eq!(unique.len(), generated.len());
        assert!(generated.iter().all(|n| n.contains('_')));
    }

    #[test]
    fn prices_and_durations_stay_in_range() {
        let mut names = generator();
        for _ in 0..500 {
            let price = names.price();
            assert!(price >= Decimal::new(155, 2) && price <= Decimal::new(15345, 2));
            assert_eq!(price % Decimal::new(155, 2), Decimal::ZERO);
            assert!((1..10).contains(&names.duration()));
        }
    }

    #[test]
    fn formats_prefixed_names() {
        assert_eq!(capitalize("brave_otter"), "Brave otter");
        assert_eq!(with_prefix("Tag", "brave_otter"), "[Tag] Brave otter");
        assert_eq!(with_prefix("GiftCertificate", "x"), "[GiftCertificate] X");
        assert_eq!(capitalize(""), "");
    }
}
