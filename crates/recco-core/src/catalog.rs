//! # Item Catalog: Single Source of Truth for Names and Primes
//!
//! The catalog assigns every known feature and category a distinct prime
//! and records, for each feature, the ordered list of categories it rolls up
//! into. It is built once at startup and never mutated.
//!
//! ## Invariants (checked by [`Catalog::new()`])
//!
//! - Every assigned value is prime.
//! - No prime is reused anywhere in the catalog. Features and categories
//!   share one namespace of primes.
//! - Every feature has at least one category, and every category it names
//!   has a prime.
//! - The modulus exceeds every assigned prime.
//!
//! The first category listed for a feature is its *primary* category, used
//! when a single canonical parent is needed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, RecoError};
use crate::identity::{Identity, ItemSet};

/// Default modulus for identity folding.
pub const DEFAULT_MODULUS: u64 = 824_633_720_831;

/// Which namespace a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A product capability deployed in a resource group.
    Feature,
    /// A higher-level classification features roll up into.
    Category,
}

impl ItemKind {
    /// Lowercase name used in messages and serialized forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized form of a single feature entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Prime assigned to the feature.
    pub prime: u64,
    /// Candidate categories, primary first.
    pub categories: Vec<String>,
}

/// Serialized, unvalidated catalog. Turn it into a [`Catalog`] with
/// [`Catalog::new()`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSpec {
    /// Modulus for identity folding.
    #[serde(default = "default_modulus")]
    pub modulus: u64,
    /// Feature name → prime and categories.
    pub features: BTreeMap<String, FeatureSpec>,
    /// Category name → prime.
    pub categories: BTreeMap<String, u64>,
}

fn default_modulus() -> u64 {
    DEFAULT_MODULUS
}

/// Validated, immutable item catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    modulus: u64,
    feature_primes: BTreeMap<String, u64>,
    category_primes: BTreeMap<String, u64>,
    feature_categories: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    /// Validate a catalog spec.
    pub fn new(spec: CatalogSpec) -> Result<Self, CatalogError> {
        let mut owners: BTreeMap<u64, String> = BTreeMap::new();
        let mut largest = 0u64;

        let features = spec
            .features
            .iter()
            .map(|(name, f)| (ItemKind::Feature, name, f.prime));
        let categories = spec
            .categories
            .iter()
            .map(|(name, prime)| (ItemKind::Category, name, *prime));

        for (kind, name, value) in features.chain(categories) {
            if !is_prime(value) {
                return Err(CatalogError::NotPrime {
                    kind,
                    name: name.clone(),
                    value,
                });
            }
            if let Some(first) = owners.insert(value, name.clone()) {
                return Err(CatalogError::DuplicatePrime {
                    value,
                    first,
                    second: name.clone(),
                });
            }
            largest = largest.max(value);
        }

        for (feature, entry) in &spec.features {
            if entry.categories.is_empty() {
                return Err(CatalogError::NoCategories(feature.clone()));
            }
            for category in &entry.categories {
                if !spec.categories.contains_key(category) {
                    return Err(CatalogError::UnknownItem {
                        kind: ItemKind::Category,
                        name: category.clone(),
                    });
                }
            }
        }

        if spec.modulus <= largest {
            return Err(CatalogError::ModulusTooSmall {
                modulus: spec.modulus,
                largest,
            });
        }

        Ok(Self::from_spec_unchecked(spec))
    }

    fn from_spec_unchecked(spec: CatalogSpec) -> Self {
        let mut feature_primes = BTreeMap::new();
        let mut feature_categories = BTreeMap::new();
        for (name, entry) in spec.features {
            feature_primes.insert(name.clone(), entry.prime);
            feature_categories.insert(name, entry.categories);
        }
        Self {
            modulus: spec.modulus,
            feature_primes,
            category_primes: spec.categories,
            feature_categories,
        }
    }

    /// The production catalog: 29 features over 12 categories.
    pub fn builtin() -> Self {
        Self::from_spec_unchecked(builtin_spec())
    }

    /// Parse and validate a catalog from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RecoError> {
        let spec: CatalogSpec =
            serde_yaml::from_str(yaml).map_err(|e| RecoError::Config(e.to_string()))?;
        Ok(Self::new(spec)?)
    }

    /// Read, parse, and validate a catalog YAML file.
    pub fn load(path: &Path) -> Result<Self, RecoError> {
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            features = catalog.feature_primes.len(),
            categories = catalog.category_primes.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Serializable form of this catalog.
    pub fn to_spec(&self) -> CatalogSpec {
        CatalogSpec {
            modulus: self.modulus,
            features: self
                .feature_primes
                .iter()
                .map(|(name, prime)| {
                    let categories = self
                        .feature_categories
                        .get(name)
                        .cloned()
                        .unwrap_or_default();
                    (
                        name.clone(),
                        FeatureSpec {
                            prime: *prime,
                            categories,
                        },
                    )
                })
                .collect(),
            categories: self.category_primes.clone(),
        }
    }

    /// Modulus used when folding identities.
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Known feature names, sorted.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.feature_primes.keys().map(String::as_str)
    }

    /// Known category names, sorted.
    pub fn category_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.category_primes.keys().map(String::as_str)
    }

    /// Whether `name` is a known item of `kind`.
    pub fn contains(&self, kind: ItemKind, name: &str) -> bool {
        self.primes(kind).contains_key(name)
    }

    /// Prime assigned to a name.
    pub fn prime(&self, kind: ItemKind, name: &str) -> Result<u64, CatalogError> {
        self.primes(kind)
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::UnknownItem {
                kind,
                name: name.to_string(),
            })
    }

    /// Prime assigned to a feature.
    pub fn feature_prime(&self, name: &str) -> Result<u64, CatalogError> {
        self.prime(ItemKind::Feature, name)
    }

    /// Prime assigned to a category.
    pub fn category_prime(&self, name: &str) -> Result<u64, CatalogError> {
        self.prime(ItemKind::Category, name)
    }

    /// Candidate categories of a feature, primary first. Never empty.
    pub fn categories_of(&self, feature: &str) -> Result<&[String], CatalogError> {
        let categories = self
            .feature_categories
            .get(feature)
            .ok_or_else(|| CatalogError::UnknownItem {
                kind: ItemKind::Feature,
                name: feature.to_string(),
            })?;
        if categories.is_empty() {
            return Err(CatalogError::NoCategories(feature.to_string()));
        }
        Ok(categories)
    }

    /// The first listed category of a feature.
    pub fn primary_category(&self, feature: &str) -> Result<&str, CatalogError> {
        self.categories_of(feature)
            .map(|categories| categories[0].as_str())
    }

    /// Primary categories of every feature in the set, as a set.
    pub fn primary_categories(&self, features: &ItemSet) -> Result<ItemSet, CatalogError> {
        features
            .iter()
            .map(|feature| self.primary_category(feature).map(str::to_string))
            .collect()
    }

    /// Identity of a set of items of one kind.
    ///
    /// Fails on the first name absent from the catalog.
    pub fn identity(&self, kind: ItemKind, items: &ItemSet) -> Result<Identity, CatalogError> {
        let primes = items
            .iter()
            .map(|name| self.prime(kind, name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Identity::fold(primes, self.modulus))
    }

    /// Identity of a feature set.
    pub fn feature_identity(&self, features: &ItemSet) -> Result<Identity, CatalogError> {
        self.identity(ItemKind::Feature, features)
    }

    /// Identity of a category set.
    pub fn category_identity(&self, categories: &ItemSet) -> Result<Identity, CatalogError> {
        self.identity(ItemKind::Category, categories)
    }

    /// Check that every name in `items` is known, returning the first miss.
    pub fn ensure_known(&self, kind: ItemKind, items: &ItemSet) -> Result<(), CatalogError> {
        match items.iter().find(|name| !self.contains(kind, name)) {
            Some(name) => Err(CatalogError::UnknownItem {
                kind,
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn primes(&self, kind: ItemKind) -> &BTreeMap<String, u64> {
        match kind {
            ItemKind::Feature => &self.feature_primes,
            ItemKind::Category => &self.category_primes,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Trial division over 6k ± 1. Catalog primes are in the low hundreds of
/// millions, so this stays well under a millisecond per value.
fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return n == 2 || n == 3;
    }
    let mut i = 5u64;
    while i.saturating_mul(i) <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

const BUILTIN_CATEGORIES: &[(&str, u64)] = &[
    ("Storage", 1_000_003),
    ("DataProcessing", 1_000_033),
    ("Reporting", 1_000_037),
    ("Web Front End", 1_000_039),
    ("APIs", 1_000_081),
    ("Security Infra", 1_000_099),
    ("SubscriptionCore", 1_000_117),
    ("Commuincation Hub", 1_000_121),
    ("Hybrid", 1_000_133),
    ("Network Isolation", 1_000_151),
    ("Cache", 1_000_159),
    ("Backend Processing", 123_123_593),
];

const BUILTIN_FEATURES: &[(&str, u64, &[&str])] = &[
    ("SQLDatabase", 3_940_427, &["Storage", "DataProcessing", "Reporting"]),
    ("AppService", 3_940_763, &["Web Front End", "APIs"]),
    ("StreamAnalytics", 1_414_297, &["DataProcessing", "Reporting"]),
    ("KeyVault", 3_125_831, &["Security Infra"]),
    ("Storage", 5_392_313, &["Storage", "Reporting", "DataProcessing"]),
    ("Automation", 6_305_339, &["Backend Processing"]),
    ("EventHub", 7_368_719, &["Commuincation Hub", "Hybrid"]),
    ("LogicApps", 7_368_629, &["DataProcessing"]),
    ("TrafficManager", 7_368_787, &["Network Isolation"]),
    ("VirtualNetwork", 2_523_893, &["Network Isolation", "Hybrid"]),
    ("DataLakeStore", 4_284_113, &["Storage", "Reporting", "DataProcessing"]),
    ("CosmosDB", 5_602_973, &["Storage", "DataProcessing", "Reporting"]),
    ("RedisCache", 5_603_713, &["Cache"]),
    ("DataFactory", 192_097, &["DataProcessing"]),
    ("DataLakeAnalytics", 192_103, &["DataProcessing", "Reporting"]),
    ("NotificationHub", 192_113, &["Commuincation Hub"]),
    ("ServiceFabric", 192_121, &["Web Front End", "APIs", "Backend Processing"]),
    ("Search", 192_133, &["APIs", "Backend Processing"]),
    (
        "VirtualMachine",
        192_149,
        &["Web Front End", "APIs", "Backend Processing", "DataProcessing"],
    ),
    ("AnalysisServices", 192_161, &["DataProcessing", "Reporting"]),
    ("Batch", 192_173, &["Backend Processing"]),
    ("ODG", 192_187, &["Hybrid"]),
    ("ERvNet", 192_191, &["Hybrid", "Network Isolation"]),
    ("CloudService", 192_193, &["Web Front End", "APIs", "Backend Processing"]),
    ("LoadBalancer", 192_229, &["Network Isolation"]),
    ("APIConnection", 192_233, &["DataProcessing"]),
    ("BotService", 192_239, &["APIs", "Commuincation Hub", "Web Front End"]),
    (
        "ContainerInstances",
        192_251,
        &["Web Front End", "APIs", "DataProcessing", "Backend Processing"],
    ),
    ("DataFactoryV2", 192_259, &["DataProcessing", "Backend Processing"]),
];

/// Spec form of the builtin catalog.
pub fn builtin_spec() -> CatalogSpec {
    CatalogSpec {
        modulus: DEFAULT_MODULUS,
        features: BUILTIN_FEATURES
            .iter()
            .map(|(name, prime, categories)| {
                (
                    name.to_string(),
                    FeatureSpec {
                        prime: *prime,
                        categories: categories.iter().map(|c| c.to_string()).collect(),
                    },
                )
            })
            .collect(),
        categories: BUILTIN_CATEGORIES
            .iter()
            .map(|(name, prime)| (name.to_string(), *prime))
            .collect(),
    }
}
