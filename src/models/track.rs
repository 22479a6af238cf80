//! Track and artist DTOs
//!
//! Mirrors the subset of VocaDB's song and artist contracts this client
//! reads. Everything except the id is optional on the wire.

use serde::{Deserialize, Serialize};

/// Credit category that marks a producer
const PRODUCER_CATEGORY: &str = "Producer";
/// Credit category that marks a singer (usually a voice synthesizer)
const VOCALIST_CATEGORY: &str = "Vocalist";
/// How many credited names the display helpers list
const MAX_CREDITED_NAMES: usize = 2;

// == Track ==
/// A song as returned by the songs endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub default_name: Option<String>,
    #[serde(default)]
    pub artist_string: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistCredit>,
    #[serde(default)]
    pub pvs: Vec<PvReference>,
    #[serde(default)]
    pub rating_score: u32,
    #[serde(default)]
    pub favorited_times: u32,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub thumb_url: Option<String>,
}

impl Track {
    /// Title in the requested language, falling back to the default name.
    pub fn display_name(&self) -> &str {
        match &self.default_name {
            Some(default) if self.name.is_empty() => default.as_str(),
            _ => self.name.as_str(),
        }
    }

    // == Link Extraction ==
    /// Picks the link to open for this track.
    ///
    /// YouTube first, then Niconico, then whatever reference comes first.
    pub fn pv_url(&self) -> Option<&str> {
        [PvService::Youtube, PvService::NicoNicoDouga]
            .iter()
            .find_map(|service| self.pvs.iter().find(|pv| pv.service == *service))
            .or_else(|| self.pvs.first())
            .map(|pv| pv.url.as_str())
    }

    /// Up to two producer names, "Unknown" without credits, "Various" when
    /// nobody is credited as producer.
    pub fn producers(&self) -> String {
        if self.artists.is_empty() {
            return "Unknown".to_string();
        }
        let names = self.credited_names(PRODUCER_CATEGORY);
        if names.is_empty() {
            "Various".to_string()
        } else {
            names.join(", ")
        }
    }

    /// Up to two vocalist names, empty when none are credited.
    pub fn vocalists(&self) -> Vec<&str> {
        self.credited_names(VOCALIST_CATEGORY)
    }

    fn credited_names(&self, category: &str) -> Vec<&str> {
        self.artists
            .iter()
            .filter(|credit| credit.has_category(category))
            .filter_map(ArtistCredit::credited_name)
            .take(MAX_CREDITED_NAMES)
            .collect()
    }
}

// == Artist Credit ==
/// One credited artist on a track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistCredit {
    #[serde(default)]
    pub artist: Option<ArtistRef>,
    /// Name given for the credit when no catalog entry is linked
    #[serde(default)]
    pub name: Option<String>,
    /// Comma separated roles, e.g. "Producer, Animator"
    #[serde(default)]
    pub categories: String,
}

impl ArtistCredit {
    pub fn credited_name(&self) -> Option<&str> {
        self.artist
            .as_ref()
            .map(|artist| artist.name.as_str())
            .or(self.name.as_deref())
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.split(',').any(|c| c.trim() == category)
    }
}

/// A catalog artist referenced from a credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: u64,
    pub name: String,
}

// == PV Reference ==
/// A hosted video for a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvReference {
    pub service: PvService,
    pub url: String,
    #[serde(default)]
    pub pv_type: Option<String>,
}

/// Video hosting service of a PV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PvService {
    Youtube,
    NicoNicoDouga,
    #[serde(other)]
    Other,
}

// == Artist Summary ==
/// An artist as returned by the artist search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub additional_names: Option<String>,
    #[serde(default)]
    pub artist_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pv(service: PvService, url: &str) -> PvReference {
        PvReference {
            service,
            url: url.to_string(),
            pv_type: Some("Original".to_string()),
        }
    }

    fn track_with_pvs(pvs: Vec<PvReference>) -> Track {
        Track {
            id: 1,
            name: "Melt".to_string(),
            default_name: None,
            artist_string: None,
            artists: vec![],
            pvs,
            rating_score: 0,
            favorited_times: 0,
            publish_date: None,
            thumb_url: None,
        }
    }

    #[test]
    fn test_pv_url_prefers_youtube() {
        let track = track_with_pvs(vec![
            pv(PvService::NicoNicoDouga, "https://nicovideo.jp/watch/sm1715919"),
            pv(PvService::Youtube, "https://youtu.be/o1jAMSQyVPc"),
        ]);
        assert_eq!(track.pv_url(), Some("https://youtu.be/o1jAMSQyVPc"));
    }

    #[test]
    fn test_pv_url_falls_back_to_niconico() {
        let track = track_with_pvs(vec![
            pv(PvService::Other, "https://piapro.jp/t/abc"),
            pv(PvService::NicoNicoDouga, "https://nicovideo.jp/watch/sm1715919"),
        ]);
        assert_eq!(track.pv_url(), Some("https://nicovideo.jp/watch/sm1715919"));
    }

    #[test]
    fn test_pv_url_falls_back_to_first_reference() {
        let track = track_with_pvs(vec![
            pv(PvService::Other, "https://soundcloud.com/x"),
            pv(PvService::Other, "https://bilibili.com/y"),
        ]);
        assert_eq!(track.pv_url(), Some("https://soundcloud.com/x"));
    }

    #[test]
    fn test_pv_url_none_without_references() {
        assert_eq!(track_with_pvs(vec![]).pv_url(), None);
    }

    #[test]
    fn test_deserialize_vocadb_song() {
        let track: Track = serde_json::from_value(json!({
            "id": 8,
            "name": "Melt",
            "defaultName": "メルト",
            "ratingScore": 3154,
            "artists": [
                { "artist": { "id": 10, "name": "ryo" }, "categories": "Producer" },
                { "artist": { "id": 1, "name": "Hatsune Miku" }, "categories": "Vocalist" },
                { "name": "someone", "categories": "Illustrator" }
            ],
            "pvs": [
                { "service": "Bilibili", "url": "https://b23.tv/x", "pvType": "Reprint" },
                { "service": "Youtube", "url": "https://youtu.be/o1jAMSQyVPc", "pvType": "Original" }
            ]
        }))
        .unwrap();

        assert_eq!(track.rating_score, 3154);
        assert_eq!(track.pvs[0].service, PvService::Other);
        assert_eq!(track.pv_url(), Some("https://youtu.be/o1jAMSQyVPc"));
        assert_eq!(track.producers(), "ryo");
        assert_eq!(track.vocalists(), vec!["Hatsune Miku"]);
    }

    #[test]
    fn test_producers_fallbacks() {
        let mut track = track_with_pvs(vec![]);
        assert_eq!(track.producers(), "Unknown");

        track.artists.push(ArtistCredit {
            artist: None,
            name: Some("GUMI".to_string()),
            categories: "Vocalist".to_string(),
        });
        assert_eq!(track.producers(), "Various");
    }

    #[test]
    fn test_producers_limits_to_two_and_reads_multi_category() {
        let mut track = track_with_pvs(vec![]);
        for (name, categories) in [("a", "Producer"), ("b", "Animator, Producer"), ("c", "Producer")] {
            track.artists.push(ArtistCredit {
                artist: None,
                name: Some(name.to_string()),
                categories: categories.to_string(),
            });
        }
        assert_eq!(track.producers(), "a, b");
    }

    #[test]
    fn test_display_name_falls_back_to_default_name() {
        let mut track = track_with_pvs(vec![]);
        track.name.clear();
        track.default_name = Some("メルト".to_string());
        assert_eq!(track.display_name(), "メルト");
    }
}
