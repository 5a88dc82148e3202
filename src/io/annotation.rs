use crate::core::overlap::DateSpan;
use crate::types::{
    format_acquisition_date, parse_acquisition_date, Episode, EpisodeKind, Footprint, VolcnetError, VolcnetResult,
};
use regex::Regex;
use std::path::Path;

/// Episodes read from one annotation file, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSet {
    pub persistent: Vec<Episode>,
    pub transient: Vec<Episode>,
}

impl AnnotationSet {
    pub fn len(&self) -> usize {
        self.persistent.len() + self.transient.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One `[section]` of an annotation file
#[derive(Debug)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, key: &str) -> VolcnetResult<&str> {
        self.get(key).ok_or_else(|| {
            VolcnetError::Annotation(format!("[{}] is missing '{}'", self.name, key))
        })
    }

    fn require_f64(&self, key: &str) -> VolcnetResult<f64> {
        let raw = self.require(key)?;
        raw.parse::<f64>().map_err(|e| {
            VolcnetError::Annotation(format!("[{}] '{}' = '{}': {}", self.name, key, raw, e))
        })
    }
}

const KNOWN_KEYS: [&str; 10] = [
    "def_episode_start",
    "def_episode_stop",
    "source",
    "def_rate",
    "def_magnitude",
    "def_polygon",
    "def_lon_west",
    "def_lon_east",
    "def_lat_south",
    "def_lat_north",
];

/// Parser for VolcNet deformation annotation files.
///
/// Files are INI-style: each `[section]` is one episode, and sections whose
/// name starts with `persistent` are persistent episodes. Footprints come from
/// `def_polygon` or from the four `def_lon_*`/`def_lat_*` bounds.
pub struct AnnotationParser;

impl AnnotationParser {
    /// Parse annotation file content
    pub fn parse_annotation(content: &str) -> VolcnetResult<AnnotationSet> {
        let mut set = AnnotationSet::default();

        for section in Self::parse_sections(content)? {
            let window = DateSpan::new(
                parse_acquisition_date(section.require("def_episode_start")?)?,
                parse_acquisition_date(section.require("def_episode_stop")?)?,
            )
            .map_err(|e| VolcnetError::DataFormat(format!("[{}] {}", section.name, e)))?;
            let source = section.require("source")?.to_string();
            let footprint = Self::section_footprint(&section)?;

            for (key, _) in &section.entries {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    log::warn!("[{}] ignoring unknown key '{}'", section.name, key);
                }
            }

            if section.name.starts_with("persistent") {
                let kind = EpisodeKind::Persistent {
                    rate: section.require_f64("def_rate")?,
                };
                set.persistent.push(Episode::new(kind, window, source, footprint)?);
            } else {
                let kind = EpisodeKind::Transient {
                    magnitude: section.require_f64("def_magnitude")?,
                };
                set.transient.push(Episode::new(kind, window, source, footprint)?);
            }
        }

        log::debug!(
            "Parsed {} persistent and {} transient episodes",
            set.persistent.len(),
            set.transient.len()
        );

        Ok(set)
    }

    fn parse_sections(content: &str) -> VolcnetResult<Vec<Section>> {
        let section_regex = Regex::new(r"^\[\s*([^\]]+?)\s*\]$")
            .map_err(|e| VolcnetError::Annotation(format!("Regex error: {}", e)))?;
        let entry_regex = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*[=:]\s*(.*?)\s*$")
            .map_err(|e| VolcnetError::Annotation(format!("Regex error: {}", e)))?;

        let mut sections: Vec<Section> = Vec::new();
        for (line_number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(captures) = section_regex.captures(line) {
                sections.push(Section {
                    name: captures[1].to_string(),
                    entries: Vec::new(),
                });
            } else if let Some(captures) = entry_regex.captures(line) {
                let section = sections.last_mut().ok_or_else(|| {
                    VolcnetError::Annotation(format!(
                        "line {}: entry outside of any section",
                        line_number + 1
                    ))
                })?;
                section
                    .entries
                    .push((captures[1].to_lowercase(), captures[2].to_string()));
            } else {
                return Err(VolcnetError::Annotation(format!(
                    "line {}: cannot parse '{}'",
                    line_number + 1,
                    line
                )));
            }
        }

        Ok(sections)
    }

    fn section_footprint(section: &Section) -> VolcnetResult<Footprint> {
        if let Some(raw) = section.get("def_polygon") {
            return Self::parse_polygon(raw)
                .map_err(|e| VolcnetError::Annotation(format!("[{}] {}", section.name, e)));
        }

        Ok(Self::bounding_box_polygon(
            section.require_f64("def_lon_west")?,
            section.require_f64("def_lon_east")?,
            section.require_f64("def_lat_south")?,
            section.require_f64("def_lat_north")?,
        ))
    }

    /// Parse a polygon written as `[(lon, lat), (lon, lat), ...]`
    pub fn parse_polygon(raw: &str) -> VolcnetResult<Footprint> {
        let vertex_regex = Regex::new(r"\(\s*([^,()\s]+)\s*,\s*([^,()\s]+)\s*\)")
            .map_err(|e| VolcnetError::Annotation(format!("Regex error: {}", e)))?;

        let mut footprint = Footprint::new();
        for captures in vertex_regex.captures_iter(raw) {
            let lon = captures[1].parse::<f64>();
            let lat = captures[2].parse::<f64>();
            match (lon, lat) {
                (Ok(lon), Ok(lat)) => footprint.push((lon, lat)),
                _ => {
                    return Err(VolcnetError::Annotation(format!(
                        "invalid polygon vertex '{}'",
                        &captures[0]
                    )))
                }
            }
        }

        if footprint.len() < 3 {
            return Err(VolcnetError::Annotation(format!(
                "polygon '{}' needs at least 3 vertices",
                raw
            )));
        }

        Ok(footprint)
    }

    /// Clockwise closed polygon (NW, NE, SE, SW, NW) around a bounding box
    pub fn bounding_box_polygon(west: f64, east: f64, south: f64, north: f64) -> Footprint {
        vec![
            (west, north),
            (east, north),
            (east, south),
            (west, south),
            (west, north),
        ]
    }

    /// Render episodes in the polygon form of the annotation format.
    ///
    /// Vertices are written with two decimal places.
    pub fn write_annotation(set: &AnnotationSet) -> String {
        let mut out = String::new();
        for (n, episode) in set.persistent.iter().enumerate() {
            Self::write_section(&mut out, &format!("persistent_deformation_{:02}", n), episode);
        }
        for (n, episode) in set.transient.iter().enumerate() {
            Self::write_section(&mut out, &format!("transient_deformation_{:02}", n), episode);
        }
        out
    }

    fn write_section(out: &mut String, name: &str, episode: &Episode) {
        let vertices: Vec<String> = episode
            .footprint
            .iter()
            .map(|(lon, lat)| format!("({:.2}, {:.2})", lon, lat))
            .collect();

        out.push_str(&format!("[{}]\n", name));
        out.push_str(&format!("def_episode_start = {}\n", format_acquisition_date(episode.window.start)));
        out.push_str(&format!("def_episode_stop = {}\n", format_acquisition_date(episode.window.stop)));
        out.push_str(&format!("source = {}\n", episode.source));
        match episode.kind {
            EpisodeKind::Persistent { rate } => out.push_str(&format!("def_rate = {}\n", rate)),
            EpisodeKind::Transient { magnitude } => out.push_str(&format!("def_magnitude = {}\n", magnitude)),
        }
        out.push_str(&format!("def_polygon = [{}]\n", vertices.join(", ")));
        out.push('\n');
    }
}

/// Read and parse an annotation file
pub fn read_annotation_file<P: AsRef<Path>>(path: P) -> VolcnetResult<AnnotationSet> {
    log::info!("Reading annotation file: {}", path.as_ref().display());
    let content = std::fs::read_to_string(path.as_ref())?;
    AnnotationParser::parse_annotation(&content)
}

/// Write episodes to an annotation file in polygon form
pub fn write_annotation_file<P: AsRef<Path>>(path: P, set: &AnnotationSet) -> VolcnetResult<()> {
    log::info!("Writing {} episodes to {}", set.len(), path.as_ref().display());
    std::fs::write(path.as_ref(), AnnotationParser::write_annotation(set))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLYGON_FILE: &str = r#"
[persistent_deformation_00]
def_episode_start = 20141213
def_episode_stop = 20170706
source = sill
def_rate = 0.4
def_polygon = [(-91.20, -0.70), (-91.00, -0.70), (-91.00, -0.90), (-91.20, -0.90), (-91.20, -0.70)]

[transient_deformation_00]
def_episode_start = 20180526
def_episode_stop = 20180607
source = dyke
def_magnitude = 0.7
def_polygon = [(-91.25, -0.75), (-91.05, -0.75), (-91.05, -0.95), (-91.25, -0.95), (-91.25, -0.75)]
"#;

    const BOUNDING_BOX_FILE: &str = r#"
# Campi Flegrei
[persistent_deformation_00]
def_lon_west = 14.05
def_lon_east = 14.20
def_lat_south = 40.78
def_lat_north = 40.86
def_episode_start = 20141031
def_episode_stop = 20210912
source = sill
def_rate = 0.08
"#;

    #[test]
    fn test_parse_polygon_file() {
        let set = AnnotationParser::parse_annotation(POLYGON_FILE).unwrap();
        assert_eq!(set.persistent.len(), 1);
        assert_eq!(set.transient.len(), 1);

        let sill = &set.persistent[0];
        assert_eq!(sill.kind, EpisodeKind::Persistent { rate: 0.4 });
        assert_eq!(sill.source, "sill");
        assert_eq!(sill.footprint.len(), 5);
        assert_eq!(sill.footprint[1], (-91.0, -0.7));

        let dyke = &set.transient[0];
        assert_eq!(dyke.kind, EpisodeKind::Transient { magnitude: 0.7 });
        assert_eq!(format_acquisition_date(dyke.window.stop), "20180607");
    }

    #[test]
    fn test_parse_bounding_box_file() {
        let set = AnnotationParser::parse_annotation(BOUNDING_BOX_FILE).unwrap();
        assert!(set.transient.is_empty());
        assert_eq!(
            set.persistent[0].footprint,
            vec![(14.05, 40.86), (14.20, 40.86), (14.20, 40.78), (14.05, 40.78), (14.05, 40.86)]
        );
    }

    #[test]
    fn test_write_then_parse() {
        let set = AnnotationParser::parse_annotation(POLYGON_FILE).unwrap();
        let written = AnnotationParser::write_annotation(&set);
        assert!(written.contains("[persistent_deformation_00]"));
        assert!(written.contains("def_polygon = [(-91.20, -0.70), (-91.00, -0.70)"));

        let reparsed = AnnotationParser::parse_annotation(&written).unwrap();
        assert_eq!(reparsed, set);
    }

    #[test]
    fn test_write_transient_section() {
        let square = vec![(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0), (0.0, 1.0)];
        let dyke = Episode::transient(0.7, "20180526", "20180607", "dyke", square).unwrap();
        let set = AnnotationSet {
            persistent: Vec::new(),
            transient: vec![dyke],
        };
        let written = AnnotationParser::write_annotation(&set);
        assert_eq!(
            written,
            "[transient_deformation_00]\n\
             def_episode_start = 20180526\n\
             def_episode_stop = 20180607\n\
             source = dyke\n\
             def_magnitude = 0.7\n\
             def_polygon = [(0.00, 1.00), (1.00, 1.00), (1.00, 0.00), (0.00, 0.00), (0.00, 1.00)]\n\n"
        );
    }

    #[test]
    fn test_missing_key_names_section() {
        let content = "[transient_deformation_00]\ndef_episode_start = 20180526\ndef_episode_stop = 20180607\nsource = dyke\ndef_polygon = [(0, 0), (1, 0), (1, 1)]\n";
        match AnnotationParser::parse_annotation(content) {
            Err(VolcnetError::Annotation(msg)) => {
                assert!(msg.contains("transient_deformation_00"));
                assert!(msg.contains("def_magnitude"));
            }
            other => panic!("expected Annotation error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_dates_are_data_format_errors() {
        let reversed = POLYGON_FILE.replace("def_episode_stop = 20180607", "def_episode_stop = 20180501");
        assert!(matches!(
            AnnotationParser::parse_annotation(&reversed),
            Err(VolcnetError::DataFormat(_))
        ));

        let malformed = POLYGON_FILE.replace("20141213", "2014121");
        match AnnotationParser::parse_annotation(&malformed) {
            Err(VolcnetError::DataFormat(msg)) => assert!(msg.contains("2014121")),
            other => panic!("expected DataFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_polygon_rejects_short_rings() {
        assert!(AnnotationParser::parse_polygon("[(0.0, 0.0), (1.0, 1.0)]").is_err());
        assert!(AnnotationParser::parse_polygon("[(0.0, x), (1.0, 1.0), (2.0, 0.0)]").is_err());
    }
}
