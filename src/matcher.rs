use serde::{Deserialize, Serialize};

/// Brand name plus alternate spellings seen in titles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrandTokens {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl BrandTokens {
    pub fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_lowercase(),
            aliases: aliases.iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    fn found_in(&self, text: &str) -> bool {
        self.spellings().any(|s| text.contains(s))
    }

    fn lowercased(self) -> Self {
        Self {
            name: self.name.to_lowercase(),
            aliases: lowercase_all(self.aliases),
        }
    }
}

/// A brand whose phrases also name a construction technique, e.g. champion reverse weave.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TechniqueRule {
    pub brand: BrandTokens,
    pub technique: String,
}

impl TechniqueRule {
    /// Space separated, hyphenated and concatenated spellings of the technique.
    pub fn variants(&self) -> Vec<String> {
        let words: Vec<&str> = self.technique.split_whitespace().collect();
        let mut variants = vec![words.join(" "), words.join("-"), words.concat()];
        variants.dedup();
        variants
    }
}

/// Attribute that, when named in the phrase, must show up in the title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeGroup {
    /// Phrase tokens that switch the requirement on.
    pub triggers: Vec<String>,
    /// Title tokens of which at least one must be present.
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeRule {
    pub brand: BrandTokens,
    #[serde(default)]
    pub attributes: Vec<AttributeGroup>,
}

/// A brand with qualifiers that must be matched verbatim when the phrase mentions them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualifierRule {
    pub brand: BrandTokens,
    #[serde(default)]
    pub qualifiers: Vec<String>,
}

/// Patterns that mark a title as only referencing a brand ("not champion", "champion style").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Disclaimers {
    pub before_brand: Vec<String>,
    pub after_brand: Vec<String>,
}

impl Default for Disclaimers {
    fn default() -> Self {
        Self {
            before_brand: to_strings(&["not ", "like ", "similar to "]),
            after_brand: to_strings(&[" style", " inspired"]),
        }
    }
}

impl Disclaimers {
    fn disclaims(&self, title: &str, brand: &BrandTokens) -> bool {
        brand.spellings().any(|spelling| {
            self.before_brand
                .iter()
                .any(|p| title.contains(&format!("{}{}", p, spelling)))
                || self
                    .after_brand
                    .iter()
                    .any(|s| title.contains(&format!("{}{}", spelling, s)))
        })
    }
}

/// Keyword tables driving classification. Passed in at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatcherConfig {
    pub technique_rules: Vec<TechniqueRule>,
    pub attribute_rules: Vec<AttributeRule>,
    pub qualifier_rules: Vec<QualifierRule>,
    pub disclaimers: Disclaimers,
    pub stop_words: Vec<String>,
    /// A lone generic token must be longer than this to count.
    pub min_single_token_len: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            technique_rules: vec![TechniqueRule {
                brand: BrandTokens::new("champion", &[]),
                technique: "reverse weave".to_string(),
            }],
            attribute_rules: vec![
                AttributeRule {
                    brand: BrandTokens::new("north face", &["northface", "tnf"]),
                    attributes: vec![AttributeGroup {
                        triggers: to_strings(&["puffer", "down"]),
                        variants: to_strings(&[
                            "puffer", "down", "nuptse", "goose", "700", "800", "insulated",
                        ]),
                    }],
                },
                AttributeRule {
                    brand: BrandTokens::new("pendleton", &[]),
                    attributes: vec![
                        AttributeGroup {
                            triggers: to_strings(&["board"]),
                            variants: to_strings(&["board"]),
                        },
                        AttributeGroup {
                            triggers: to_strings(&["loop"]),
                            variants: to_strings(&["loop"]),
                        },
                    ],
                },
            ],
            qualifier_rules: vec![QualifierRule {
                brand: BrandTokens::new("levi", &[]),
                qualifiers: to_strings(&["black", "made in usa"]),
            }],
            disclaimers: Disclaimers::default(),
            stop_words: to_strings(&[
                "vintage", "retro", "70s", "80s", "90s", "00s", "y2k", "the", "a", "an", "and",
                "or", "of", "for", "with", "in", "by",
            ]),
            min_single_token_len: 3,
        }
    }
}

impl MatcherConfig {
    /// Titles and phrases are compared in lowercase, so the tables must be too.
    fn lowercased(self) -> Self {
        Self {
            technique_rules: self
                .technique_rules
                .into_iter()
                .map(|rule| TechniqueRule {
                    brand: rule.brand.lowercased(),
                    technique: rule.technique.to_lowercase(),
                })
                .collect(),
            attribute_rules: self
                .attribute_rules
                .into_iter()
                .map(|rule| AttributeRule {
                    brand: rule.brand.lowercased(),
                    attributes: rule
                        .attributes
                        .into_iter()
                        .map(|group| AttributeGroup {
                            triggers: lowercase_all(group.triggers),
                            variants: lowercase_all(group.variants),
                        })
                        .collect(),
                })
                .collect(),
            qualifier_rules: self
                .qualifier_rules
                .into_iter()
                .map(|rule| QualifierRule {
                    brand: rule.brand.lowercased(),
                    qualifiers: lowercase_all(rule.qualifiers),
                })
                .collect(),
            disclaimers: Disclaimers {
                before_brand: lowercase_all(self.disclaimers.before_brand),
                after_brand: lowercase_all(self.disclaimers.after_brand),
            },
            stop_words: lowercase_all(self.stop_words),
            min_single_token_len: self.min_single_token_len,
        }
    }
}

/// Category a phrase falls into, with the tokens its rule needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhraseCategory {
    BrandTechnique {
        brand: BrandTokens,
        variants: Vec<String>,
    },
    BrandWithAttribute {
        brand: BrandTokens,
        /// One entry per attribute the phrase mentions; each needs a hit.
        required: Vec<Vec<String>>,
    },
    BrandWithQualifiers {
        brand: BrandTokens,
        /// Qualifiers present in the phrase, each required verbatim.
        required: Vec<String>,
    },
    Generic {
        tokens: Vec<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RelevanceMatcher {
    config: MatcherConfig,
}

impl RelevanceMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            config: config.lowercased(),
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Whether `title` belongs to the category described by `phrase`.
    pub fn matches(&self, title: &str, phrase: &str) -> bool {
        self.accepts(&self.classify(phrase), title)
    }

    pub fn classify(&self, phrase: &str) -> PhraseCategory {
        let phrase = phrase.to_lowercase();

        for rule in &self.config.technique_rules {
            let variants = rule.variants();
            if rule.brand.found_in(&phrase) && variants.iter().any(|v| phrase.contains(v.as_str())) {
                return PhraseCategory::BrandTechnique {
                    brand: rule.brand.clone(),
                    variants,
                };
            }
        }

        for rule in &self.config.attribute_rules {
            if rule.brand.found_in(&phrase) {
                let phrase_tokens = tokenize(&phrase);
                let required = rule
                    .attributes
                    .iter()
                    .filter(|group| {
                        group
                            .triggers
                            .iter()
                            .any(|t| phrase_tokens.iter().any(|p| p == t))
                    })
                    .map(|group| group.variants.clone())
                    .collect();
                return PhraseCategory::BrandWithAttribute {
                    brand: rule.brand.clone(),
                    required,
                };
            }
        }

        for rule in &self.config.qualifier_rules {
            if rule.brand.found_in(&phrase) {
                let required = rule
                    .qualifiers
                    .iter()
                    .filter(|q| phrase.contains(q.as_str()))
                    .cloned()
                    .collect();
                return PhraseCategory::BrandWithQualifiers {
                    brand: rule.brand.clone(),
                    required,
                };
            }
        }

        let mut tokens: Vec<String> = Vec::new();
        for token in tokenize(&phrase) {
            if !self.config.stop_words.contains(&token) && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        PhraseCategory::Generic { tokens }
    }

    /// Apply an already-classified phrase to a title.
    pub fn accepts(&self, category: &PhraseCategory, title: &str) -> bool {
        let title = title.to_lowercase();

        match category {
            PhraseCategory::BrandTechnique { brand, variants } => {
                brand.found_in(&title)
                    && variants.iter().any(|v| title.contains(v.as_str()))
                    && !self.config.disclaimers.disclaims(&title, brand)
            }
            PhraseCategory::BrandWithAttribute { brand, required } => {
                brand.found_in(&title)
                    && required
                        .iter()
                        .all(|variants| variants.iter().any(|v| title.contains(v.as_str())))
            }
            PhraseCategory::BrandWithQualifiers { brand, required } => {
                brand.found_in(&title) && required.iter().all(|q| title.contains(q.as_str()))
            }
            PhraseCategory::Generic { tokens } => match tokens.len() {
                0 => false,
                1 => {
                    tokens[0].chars().count() > self.config.min_single_token_len
                        && title.contains(tokens[0].as_str())
                }
                _ => tokens.iter().filter(|t| title.contains(t.as_str())).count() >= 2,
            },
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn lowercase_all(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|s| s.to_lowercase()).collect()
}
