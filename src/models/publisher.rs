//! The module related to publishers.
//!
//! A [`Publisher`] is an organization publishing information about CVEs:
//! the NVD itself, a vendor or a Linux distribution. Each one has its own
//! page layout, URL scheme and tolerance to automated requests, which
//! are gathered in a [`CollectorProfile`].

use std::path::{Path, PathBuf};

use clap::{builder::PossibleValue, ValueEnum};

use crate::extractors::aqua::AquaExtractor;
use crate::extractors::ibm::IbmExtractor;
use crate::extractors::nvd::NvdExtractor;
use crate::extractors::redhat::RedHatExtractor;
use crate::extractors::ubuntu::UbuntuExtractor;
use crate::extractors::Extractor;
use crate::readers::BlockRule;

use super::Identifier;

/// An enumeration of the publishers cvefold knows how to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Publisher {
    /// The NVD JSON 1.1 feeds. They are never fetched page by page, the
    /// yearly feed is read directly.
    Nvd,
    /// Aqua Vulnerability Database
    Aqua,
    /// IBM X-Force Exchange, requires a manual login.
    Ibm,
    Ubuntu,
    /// Red Hat security data API
    RedHat,
}

/// How the identifier is written in a publisher URL.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IdCase {
    AsIs,
    Lower,
}

impl IdCase {
    /// Applies the case rule to an identifier.
    pub fn apply(&self, identifier: &Identifier) -> String {
        match self {
            IdCase::AsIs => identifier.as_str().to_string(),
            IdCase::Lower => identifier.as_str().to_lowercase(),
        }
    }
}

/// Everything needed to collect the pages of one publisher.
#[derive(Clone, Debug)]
pub struct CollectorProfile {
    /// The URL of a page. `{id}` and `{year}` are replaced.
    pub url_template: String,
    /// How `{id}` is written in the URL.
    pub id_case: IdCase,
    /// The extension of the saved artifacts, without the dot.
    pub extension: String,
    /// How to recognize a page telling we have been blocked.
    pub block_rule: BlockRule,
    /// Whether an operator has to log in before the workers start.
    pub requires_login: bool,
}

impl CollectorProfile {
    /// Builds the URL of the page of an identifier.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cvefold::models::{Identifier, Publisher};
    ///
    /// let profile = Publisher::Aqua.profile().unwrap();
    /// let id = Identifier::new("CVE-2024-0001").unwrap();
    /// assert_eq!(
    ///     "https://avd.aquasec.com/nvd/2024/cve-2024-0001/",
    ///     profile.url_for(&id, "2024")
    /// );
    /// ```
    pub fn url_for(&self, identifier: &Identifier, year: &str) -> String {
        self.url_template
            .replace("{id}", &self.id_case.apply(identifier))
            .replace("{year}", year)
    }
}

impl Publisher {
    /// The key used for this publisher in the canonical records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nvd => "nvd",
            Self::Aqua => "aqua",
            Self::Ibm => "ibm",
            Self::Ubuntu => "ubuntu",
            Self::RedHat => "redhat",
        }
    }

    /// The directory holding the raw artifacts of a year.
    pub fn artifact_dir(&self, data_dir: &Path, year: &str) -> PathBuf {
        match self {
            Self::RedHat => data_dir.join("redhat").join("api").join(year),
            _ => data_dir.join(self.name()).join(year),
        }
    }

    /// The collection profile of the publisher.
    /// NVD has none, its data comes from the yearly feed.
    pub fn profile(&self) -> Option<CollectorProfile> {
        match self {
            Self::Nvd => None,
            Self::Aqua => Some(CollectorProfile {
                url_template: "https://avd.aquasec.com/nvd/{year}/{id}/".to_string(),
                id_case: IdCase::Lower,
                extension: "html".to_string(),
                block_rule: BlockRule::default(),
                requires_login: false,
            }),
            Self::Ibm => Some(CollectorProfile {
                url_template: "https://exchange.xforce.ibmcloud.com/vulnerabilities/{id}/"
                    .to_string(),
                id_case: IdCase::AsIs,
                extension: "html".to_string(),
                block_rule: BlockRule::default().with_title_marker("Access Denied"),
                requires_login: true,
            }),
            Self::Ubuntu => Some(CollectorProfile {
                url_template: "https://ubuntu.com/security/cves/{id}.json".to_string(),
                id_case: IdCase::AsIs,
                extension: "json".to_string(),
                block_rule: BlockRule::default(),
                requires_login: false,
            }),
            Self::RedHat => Some(CollectorProfile {
                url_template:
                    "https://access.redhat.com/hydra/rest/securitydata/cve/{id}.json"
                        .to_string(),
                id_case: IdCase::AsIs,
                extension: "json".to_string(),
                block_rule: BlockRule::default(),
                requires_login: false,
            }),
        }
    }

    /// The extractor reading the artifacts of this publisher.
    /// When a publisher is added, its extractor has to be returned here.
    pub fn extractor(&self) -> Box<dyn Extractor + Send + Sync> {
        match self {
            Self::Nvd => Box::new(NvdExtractor::new()),
            Self::Aqua => Box::new(AquaExtractor::new()),
            Self::Ibm => Box::new(IbmExtractor::new()),
            Self::Ubuntu => Box::new(UbuntuExtractor::new()),
            Self::RedHat => Box::new(RedHatExtractor::new()),
        }
    }
}

impl ValueEnum for Publisher {
    /// Lists the variants available for clap
    fn value_variants<'a>() -> &'a [Self] {
        &[
            Publisher::Nvd,
            Publisher::Aqua,
            Publisher::Ibm,
            Publisher::Ubuntu,
            Publisher::RedHat,
        ]
    }

    /// Map each value to a possible value in clap
    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(PossibleValue::new(self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_rules_are_publisher_specific() {
        let id = Identifier::new("CVE-2023-12345").unwrap();
        let aqua = Publisher::Aqua.profile().unwrap();
        let ibm = Publisher::Ibm.profile().unwrap();
        assert_eq!(
            "https://avd.aquasec.com/nvd/2023/cve-2023-12345/",
            aqua.url_for(&id, "2023")
        );
        assert_eq!(
            "https://exchange.xforce.ibmcloud.com/vulnerabilities/CVE-2023-12345/",
            ibm.url_for(&id, "2023")
        );
    }

    #[test]
    fn only_ibm_requires_a_login() {
        for publisher in Publisher::value_variants() {
            let requires_login = publisher
                .profile()
                .map(|p| p.requires_login)
                .unwrap_or(false);
            assert_eq!(*publisher == Publisher::Ibm, requires_login);
        }
    }

    #[test]
    fn nvd_is_not_collected() {
        assert!(Publisher::Nvd.profile().is_none());
    }

    #[test]
    fn artifact_dirs() {
        let data = Path::new("data");
        assert_eq!(
            Path::new("data/redhat/api/2022"),
            Publisher::RedHat.artifact_dir(data, "2022")
        );
        assert_eq!(
            Path::new("data/aqua/2022"),
            Publisher::Aqua.artifact_dir(data, "2022")
        );
    }

    #[test]
    fn extractors_match_their_publisher() {
        for publisher in Publisher::value_variants() {
            assert_eq!(*publisher, publisher.extractor().publisher());
        }
    }
}
