use std::path::Path;

use serde::Serialize;

use crate::error::{InsightsError, Result};
use crate::models::{Phase, SearchDocument};

const SAME_PHASE_BOOST: i32 = 10;

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: String,
    pub phases: Vec<Phase>,
    pub categories: Vec<String>,
    pub current_phase: Option<Phase>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    pub document: &'a SearchDocument,
    pub rank: i32,
}

fn matches_text(document: &SearchDocument, needle: &str) -> bool {
    document.title.to_lowercase().contains(needle)
        || document.description.to_lowercase().contains(needle)
        || document
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

fn matches_facets(document: &SearchDocument, query: &SearchQuery) -> bool {
    let phase_ok = query.phases.is_empty() || query.phases.contains(&document.phase);
    let category_ok = query.categories.is_empty()
        || query
            .categories
            .iter()
            .any(|category| category.eq_ignore_ascii_case(&document.category));
    phase_ok && category_ok
}

fn rank(document: &SearchDocument, current_phase: Option<Phase>) -> i32 {
    if current_phase == Some(document.phase) {
        document.relevance_score + SAME_PHASE_BOOST
    } else {
        document.relevance_score
    }
}

/// Filters and ranks the catalog. Blank queries return nothing; callers
/// show [`quick_access`] instead. Non-blank text is matched as typed.
pub fn search<'a>(catalog: &'a [SearchDocument], query: &SearchQuery) -> Vec<SearchHit<'a>> {
    if query.text.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.text.to_lowercase();

    let mut hits: Vec<SearchHit<'a>> = catalog
        .iter()
        .filter(|document| matches_text(document, &needle) && matches_facets(document, query))
        .map(|document| SearchHit {
            document,
            rank: rank(document, query.current_phase),
        })
        .collect();

    hits.sort_by(|a, b| b.rank.cmp(&a.rank));
    hits
}

/// Highest-relevance documents for the current phase, or for the whole
/// catalog when no phase is known.
pub fn quick_access(
    catalog: &[SearchDocument],
    current_phase: Option<Phase>,
    limit: usize,
) -> Vec<&SearchDocument> {
    let mut documents: Vec<&SearchDocument> = catalog
        .iter()
        .filter(|document| current_phase.map_or(true, |phase| document.phase == phase))
        .collect();
    documents.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    documents.truncate(limit);
    documents
}

pub fn load_catalog(path: &Path) -> Result<Vec<SearchDocument>> {
    let raw = std::fs::read_to_string(path).map_err(|source| InsightsError::Io {
        source,
        context: format!("reading catalog {}", path.display()),
    })?;
    serde_json::from_str(&raw).map_err(|source| InsightsError::Json {
        source,
        context: format!("parsing catalog {}", path.display()),
    })
}

fn document(
    id: &str,
    title: &str,
    description: &str,
    phase: Phase,
    category: &str,
    tags: &[&str],
    relevance_score: i32,
) -> SearchDocument {
    SearchDocument {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        phase,
        category: category.to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        relevance_score,
    }
}

pub fn default_catalog() -> Vec<SearchDocument> {
    vec![
        document(
            "edu-scholarships",
            "Scholarship Programs",
            "Government and private scholarships for Emirati students at home and abroad",
            Phase::Education,
            "programs",
            &["funding", "university", "students"],
            95,
        ),
        document(
            "edu-stem",
            "STEM Learning Pathways",
            "Science, technology and engineering tracks for secondary school students",
            Phase::Education,
            "courses",
            &["science", "technology", "students"],
            88,
        ),
        document(
            "edu-guidance",
            "University Admission Guidance",
            "Step by step support for choosing a major and applying to universities",
            Phase::Education,
            "services",
            &["university", "counselling"],
            82,
        ),
        document(
            "career-jobs",
            "Job Opportunities Portal",
            "Open vacancies in government and private sector entities across Dubai",
            Phase::Career,
            "services",
            &["jobs", "employment", "vacancies"],
            96,
        ),
        document(
            "career-internships",
            "Internship Programs",
            "Paid internships that give graduates their first workplace experience",
            Phase::Career,
            "programs",
            &["graduates", "experience", "students"],
            90,
        ),
        document(
            "career-cv",
            "CV and Interview Workshops",
            "Hands-on sessions to prepare a strong CV and practise interviews",
            Phase::Career,
            "events",
            &["workshop", "interview", "skills"],
            84,
        ),
        document(
            "pro-leadership",
            "Leadership Development Program",
            "Executive leadership training for mid-career professionals",
            Phase::Professional,
            "programs",
            &["leadership", "management", "skills"],
            93,
        ),
        document(
            "pro-mentorship",
            "Mentorship Network",
            "Connect with experienced mentors and track shared development goals",
            Phase::Professional,
            "communities",
            &["mentor", "networking", "goals"],
            89,
        ),
        document(
            "pro-certifications",
            "Professional Certifications",
            "Accredited certification courses in finance, technology and project management",
            Phase::Professional,
            "courses",
            &["certification", "technology", "skills"],
            86,
        ),
        document(
            "life-legacy",
            "Legacy Projects",
            "Contribute experience to community projects that preserve national heritage",
            Phase::Lifelong,
            "communities",
            &["heritage", "volunteering", "culture"],
            87,
        ),
        document(
            "life-culture",
            "Cultural Preservation Archive",
            "Stories, crafts and traditions recorded by senior citizens",
            Phase::Lifelong,
            "resources",
            &["heritage", "culture", "stories"],
            80,
        ),
        document(
            "life-events",
            "Virtual Community Events",
            "Online talks and gatherings open to citizens of every age",
            Phase::Lifelong,
            "events",
            &["online", "networking", "community"],
            78,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn query(text: &str) -> SearchQuery {
        SearchQuery {
            text: text.to_string(),
            ..SearchQuery::default()
        }
    }

    fn ids(hits: &[SearchHit<'_>]) -> Vec<String> {
        hits.iter().map(|hit| hit.document.id.clone()).collect()
    }

    #[test]
    fn blank_query_returns_nothing() {
        let catalog = default_catalog();
        assert!(search(&catalog, &query("")).is_empty());
        assert!(search(&catalog, &query("   ")).is_empty());
    }

    #[test]
    fn matches_title_description_and_tags_case_insensitively() {
        let catalog = default_catalog();
        let by_title = search(&catalog, &query("SCHOLARSHIP"));
        assert_eq!(ids(&by_title), vec!["edu-scholarships"]);

        let by_tag = ids(&search(&catalog, &query("heritage")));
        assert_eq!(by_tag, vec!["life-legacy", "life-culture"]);

        let by_description = ids(&search(&catalog, &query("senior citizens")));
        assert_eq!(by_description, vec!["life-culture"]);
    }

    #[test]
    fn surrounding_spaces_are_part_of_the_needle() {
        let catalog = default_catalog();
        assert!(search(&catalog, &query(" heritage ")).is_empty());
        assert_eq!(
            ids(&search(&catalog, &query("national heritage"))),
            vec!["life-legacy"]
        );
    }

    #[test]
    fn loads_catalog_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "a", "title": "Falconry Club", "description": "Weekend meetups",
                  "phase": "lifelong", "category": "communities", "tags": ["heritage"],
                  "relevance_score": 70}},
                {{"id": "b", "title": "Coding Bootcamp", "description": "Intensive course",
                  "phase": "career", "category": "courses", "relevance_score": 65}}
            ]"#
        )
        .unwrap();

        let catalog = load_catalog(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].phase, Phase::Lifelong);
        assert_eq!(catalog[0].tags, vec!["heritage".to_string()]);
        assert!(catalog[1].tags.is_empty());
        assert_eq!(ids(&search(&catalog, &query("bootcamp"))), vec!["b"]);
    }

    #[test]
    fn malformed_catalog_is_a_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "a", "title": }}]"#).unwrap();
        let err = load_catalog(file.path()).unwrap_err();
        assert!(matches!(err, InsightsError::Json { .. }));
    }

    #[test]
    fn missing_catalog_is_an_io_error() {
        let err = load_catalog(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, InsightsError::Io { .. }));
    }

    #[test]
    fn no_match_is_empty() {
        let catalog = default_catalog();
        assert!(search(&catalog, &query("astronaut")).is_empty());
    }

    #[test]
    fn facets_combine_or_within_and_across() {
        let catalog = default_catalog();
        let mut q = query("students");
        q.phases = vec![Phase::Education, Phase::Career];
        q.categories = vec!["programs".to_string()];

        let hits = search(&catalog, &q);
        assert_eq!(ids(&hits), vec!["edu-scholarships", "career-internships"]);

        for document in &catalog {
            let text_match = matches_text(document, "students");
            let expected = text_match
                && q.phases.contains(&document.phase)
                && q.categories.contains(&document.category);
            let found = hits.iter().any(|hit| hit.document.id == document.id);
            assert_eq!(found, expected, "document {}", document.id);
        }
    }

    #[test]
    fn same_phase_boost_breaks_ties() {
        let catalog = vec![
            document("a", "Skills A", "", Phase::Career, "courses", &[], 50),
            document("b", "Skills B", "", Phase::Lifelong, "courses", &[], 50),
        ];
        let mut q = query("skills");
        q.current_phase = Some(Phase::Lifelong);
        let hits = search(&catalog, &q);
        assert_eq!(ids(&hits), vec!["b", "a"]);
        assert_eq!(hits[0].rank, 60);
    }

    #[test]
    fn equal_ranks_keep_catalog_order() {
        let catalog = vec![
            document("first", "Workshop", "", Phase::Career, "events", &[], 70),
            document("second", "Workshop", "", Phase::Career, "events", &[], 70),
        ];
        assert_eq!(ids(&search(&catalog, &query("workshop"))), vec!["first", "second"]);
    }

    #[test]
    fn boost_is_flat_not_weighted() {
        let catalog = vec![
            document("strong", "Mentor", "", Phase::Career, "communities", &[], 95),
            document("boosted", "Mentor", "", Phase::Professional, "communities", &[], 80),
        ];
        let mut q = query("mentor");
        q.current_phase = Some(Phase::Professional);
        assert_eq!(ids(&search(&catalog, &q)), vec!["strong", "boosted"]);
    }

    #[test]
    fn quick_access_prefers_current_phase() {
        let catalog = default_catalog();
        let picks = quick_access(&catalog, Some(Phase::Professional), 2);
        let picked: Vec<&str> = picks.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(picked, vec!["pro-leadership", "pro-mentorship"]);

        let overall = quick_access(&catalog, None, 1);
        assert_eq!(overall[0].id, "career-jobs");
    }
}
