//! Voice selection.
//!
//! Platforms expose many synthesis voices of uneven quality.  Given a target
//! locale, [`VoiceResolver`] walks a fixed priority ladder and returns the
//! first voice that satisfies the highest-ranked rule:
//!
//! | Rank | Rule                                              |
//! |------|---------------------------------------------------|
//! | 1    | primary vendor, exact locale                      |
//! | 2    | primary vendor, same base language                |
//! | 3    | neural vendor + "Neural" tag, exact locale        |
//! | 4    | neural vendor + "Neural" tag, same base language  |
//! | 5    | "Premium"/"Enhanced" tag, exact locale            |
//! | 6    | "Premium"/"Enhanced" tag, same base language      |
//! | 7    | any voice, exact locale                           |
//! | 8    | any voice, same base language                     |
//! | 9    | first voice in the list                           |
//!
//! Within a rule the first voice in input order wins.

use serde::{Deserialize, Serialize};

use crate::config::VoiceConfig;

/// Locale assumed when the caller supplies none.
pub const DEFAULT_LOCALE: &str = "en-US";

// ---------------------------------------------------------------------------
// VoiceDescriptor
// ---------------------------------------------------------------------------

/// An available synthesis voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    pub name: String,
    /// Locale tag such as `"ja-JP"`.
    #[serde(alias = "lang", alias = "language")]
    pub locale: String,
}

impl VoiceDescriptor {
    pub fn new(name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locale: locale.into(),
        }
    }

    /// Decode a voice list: a bare array, or an object with a `voices` array.
    pub fn list_from_json(raw: &str) -> Result<Vec<Self>, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum VoiceList {
            Bare(Vec<VoiceDescriptor>),
            Wrapped { voices: Vec<VoiceDescriptor> },
        }

        Ok(match serde_json::from_str(raw)? {
            VoiceList::Bare(voices) | VoiceList::Wrapped { voices } => voices,
        })
    }
}

/// Lower-case the locale and use `-` as the subtag separator.
pub fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_ascii_lowercase()
}

/// The language subtag before the first hyphen (`"en"` from `"en-US"`).
pub fn base_language(locale: &str) -> &str {
    locale.split('-').next().unwrap_or(locale)
}

// ---------------------------------------------------------------------------
// VoiceRule
// ---------------------------------------------------------------------------

/// One rung of the selection ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceRule {
    PrimaryVendorExact,
    PrimaryVendorLanguage,
    NeuralExact,
    NeuralLanguage,
    QualityExact,
    QualityLanguage,
    AnyExact,
    AnyLanguage,
    FirstAvailable,
}

impl VoiceRule {
    /// Rules in evaluation order.
    pub const LADDER: [VoiceRule; 9] = [
        VoiceRule::PrimaryVendorExact,
        VoiceRule::PrimaryVendorLanguage,
        VoiceRule::NeuralExact,
        VoiceRule::NeuralLanguage,
        VoiceRule::QualityExact,
        VoiceRule::QualityLanguage,
        VoiceRule::AnyExact,
        VoiceRule::AnyLanguage,
        VoiceRule::FirstAvailable,
    ];
}

/// Normalised target locale and its base language.
struct Target {
    locale: String,
    language: String,
}

impl Target {
    fn new(requested: Option<&str>) -> Self {
        let requested = requested
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCALE);
        let locale = normalize_locale(requested);
        let language = base_language(&locale).to_string();
        Self { locale, language }
    }
}

// ---------------------------------------------------------------------------
// VoiceResolver
// ---------------------------------------------------------------------------

/// Picks the best voice for a locale.
#[derive(Debug, Clone)]
pub struct VoiceResolver {
    primary_vendor: String,
    neural_vendor: String,
}

impl Default for VoiceResolver {
    fn default() -> Self {
        Self::from_config(&VoiceConfig::default())
    }
}

impl VoiceResolver {
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self {
            primary_vendor: config.primary_vendor.clone(),
            neural_vendor: config.neural_vendor.clone(),
        }
    }

    /// Return the best voice for `target`, or `None` only when `voices` is empty.
    pub fn resolve<'a>(
        &self,
        target: Option<&str>,
        voices: &'a [VoiceDescriptor],
    ) -> Option<&'a VoiceDescriptor> {
        self.resolve_with_rule(target, voices).map(|(voice, _)| voice)
    }

    /// Like [`resolve`](Self::resolve) but also reports which rule matched.
    pub fn resolve_with_rule<'a>(
        &self,
        target: Option<&str>,
        voices: &'a [VoiceDescriptor],
    ) -> Option<(&'a VoiceDescriptor, VoiceRule)> {
        let target = Target::new(target);

        let found = VoiceRule::LADDER.iter().find_map(|rule| {
            voices
                .iter()
                .find(|voice| self.matches(*rule, voice, &target))
                .map(|voice| (voice, *rule))
        });

        match &found {
            Some((voice, rule)) => {
                log::debug!(
                    "voice: {:?} for {} via {:?}",
                    voice.name,
                    target.locale,
                    rule
                );
            }
            None => log::warn!("voice: no voices available for {}", target.locale),
        }
        found
    }

    fn matches(&self, rule: VoiceRule, voice: &VoiceDescriptor, target: &Target) -> bool {
        let locale = normalize_locale(&voice.locale);
        let exact = locale == target.locale;
        let same_language = base_language(&locale) == target.language;

        let primary = voice.name.contains(&self.primary_vendor);
        let neural = voice.name.contains(&self.neural_vendor) && voice.name.contains("Neural");
        let quality = voice.name.contains("Premium") || voice.name.contains("Enhanced");

        match rule {
            VoiceRule::PrimaryVendorExact => primary && exact,
            VoiceRule::PrimaryVendorLanguage => primary && same_language,
            VoiceRule::NeuralExact => neural && exact,
            VoiceRule::NeuralLanguage => neural && same_language,
            VoiceRule::QualityExact => quality && exact,
            VoiceRule::QualityLanguage => quality && same_language,
            VoiceRule::AnyExact => exact,
            VoiceRule::AnyLanguage => same_language,
            VoiceRule::FirstAvailable => true,
        }
    }
}

/// Resolve with the default vendor preferences.
pub fn resolve_voice<'a>(
    target: Option<&str>,
    voices: &'a [VoiceDescriptor],
) -> Option<&'a VoiceDescriptor> {
    VoiceResolver::default().resolve(target, voices)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str, locale: &str) -> VoiceDescriptor {
        VoiceDescriptor::new(name, locale)
    }

    fn rule_for(target: Option<&str>, voices: &[VoiceDescriptor]) -> (String, VoiceRule) {
        let (voice, rule) = VoiceResolver::default()
            .resolve_with_rule(target, voices)
            .expect("non-empty list");
        (voice.name.clone(), rule)
    }

    #[test]
    fn primary_vendor_beats_earlier_voice() {
        let voices = [v("Microsoft Ayumi", "ja-JP"), v("Google 日本語", "ja-JP")];
        let voice = resolve_voice(Some("ja-JP"), &voices).unwrap();
        assert_eq!(voice.name, "Google 日本語");
    }

    #[test]
    fn base_language_fallback_for_unlisted_locale() {
        let voices = [v("Google US English", "en-US"), v("Google 日本語", "ja-JP")];
        assert_eq!(
            rule_for(Some("ja-CN"), &voices),
            ("Google 日本語".into(), VoiceRule::PrimaryVendorLanguage)
        );
    }

    #[test]
    fn first_voice_when_nothing_matches() {
        let voices = [v("Microsoft David", "en-US")];
        assert_eq!(
            rule_for(Some("ja-JP"), &voices),
            ("Microsoft David".into(), VoiceRule::FirstAvailable)
        );
    }

    #[test]
    fn exact_primary_beats_language_primary() {
        let voices = [v("Google UK English", "en-GB"), v("Google US English", "en-US")];
        assert_eq!(
            rule_for(Some("en-US"), &voices).1,
            VoiceRule::PrimaryVendorExact
        );
    }

    #[test]
    fn neural_vendor_ranks_above_quality_tags() {
        let voices = [
            v("Samantha (Enhanced)", "en-US"),
            v("Microsoft Aria Online (Natural) - Neural", "en-US"),
        ];
        assert_eq!(
            rule_for(Some("en-US"), &voices),
            (
                "Microsoft Aria Online (Natural) - Neural".into(),
                VoiceRule::NeuralExact
            )
        );
    }

    #[test]
    fn neural_tag_requires_neural_vendor() {
        let voices = [v("Acme Neural", "de-DE"), v("Anna (Premium)", "de-DE")];
        assert_eq!(rule_for(Some("de-DE"), &voices).1, VoiceRule::QualityExact);
    }

    #[test]
    fn neural_language_beats_quality_exact() {
        let voices = [v("Anna (Premium)", "de-DE"), v("Microsoft Jonas Neural", "de-AT")];
        assert_eq!(rule_for(Some("de-DE"), &voices).1, VoiceRule::NeuralLanguage);
    }

    #[test]
    fn quality_language_match() {
        let voices = [v("Thomas", "fr-FR"), v("Amélie (Enhanced)", "fr-CA")];
        assert_eq!(rule_for(Some("fr-FR"), &voices).1, VoiceRule::QualityLanguage);
    }

    #[test]
    fn any_exact_then_any_language() {
        let voices = [v("Paulina", "es-MX"), v("Monica", "es-ES")];
        assert_eq!(
            rule_for(Some("es-ES"), &voices),
            ("Monica".into(), VoiceRule::AnyExact)
        );
        assert_eq!(
            rule_for(Some("es-AR"), &voices),
            ("Paulina".into(), VoiceRule::AnyLanguage)
        );
    }

    #[test]
    fn ties_resolve_in_input_order() {
        let voices = [v("Google A", "it-IT"), v("Google B", "it-IT")];
        assert_eq!(rule_for(Some("it-IT"), &voices).0, "Google A");
    }

    #[test]
    fn missing_target_defaults_to_en_us() {
        let voices = [v("Kyoko", "ja-JP"), v("Alex", "en-US")];
        assert_eq!(rule_for(None, &voices).0, "Alex");
        assert_eq!(rule_for(Some(""), &voices).0, "Alex");
        assert_eq!(rule_for(Some("   "), &voices).0, "Alex");
    }

    #[test]
    fn locale_comparison_ignores_case_and_underscore() {
        let voices = [v("Kyoko", "ja_JP")];
        assert_eq!(rule_for(Some("JA-jp"), &voices).1, VoiceRule::AnyExact);
    }

    #[test]
    fn empty_list_returns_none() {
        assert!(resolve_voice(Some("en-US"), &[]).is_none());
    }

    #[test]
    fn configurable_vendors() {
        let resolver = VoiceResolver::from_config(&VoiceConfig {
            primary_vendor: "Apple".into(),
            neural_vendor: "Microsoft".into(),
        });
        let voices = [v("Google Deutsch", "de-DE"), v("Apple Anna", "de-DE")];
        assert_eq!(resolver.resolve(Some("de-DE"), &voices).unwrap().name, "Apple Anna");
    }

    #[test]
    fn base_language_helper() {
        assert_eq!(base_language("en-US"), "en");
        assert_eq!(base_language("yue"), "yue");
        assert_eq!(base_language("zh-Hant-TW"), "zh");
    }

    #[test]
    fn voice_list_shapes() {
        let bare = VoiceDescriptor::list_from_json(
            r#"[{"name":"Google 日本語","locale":"ja-JP"},{"name":"Kyoko","lang":"ja-JP"}]"#,
        )
        .unwrap();
        assert_eq!(bare.len(), 2);

        let wrapped =
            VoiceDescriptor::list_from_json(r#"{"voices":[{"name":"Alex","language":"en-US"}]}"#)
                .unwrap();
        assert_eq!(wrapped, vec![v("Alex", "en-US")]);

        assert!(VoiceDescriptor::list_from_json(r#"{"name":"lonely"}"#).is_err());
    }

    #[test]
    fn descriptor_accepts_lang_alias() {
        let voice: VoiceDescriptor =
            serde_json::from_str(r#"{"name":"Kyoko","lang":"ja-JP"}"#).unwrap();
        assert_eq!(voice, v("Kyoko", "ja-JP"));
    }
}
