//! Per-source translation of raw records into unified records.
//!
//! Every mapper is total and side-effect free: absent fields become empty
//! strings and `split` is always left empty for the caller to stamp.

use crate::constants::schema::{SOLUTION_SEPARATOR, TAG_SEPARATOR, TITLE_PLACEHOLDER_SUFFIX};
use crate::schema::UnifiedRecord;

use super::fields::{RawRecord, first_present, list_text, title_or_placeholder};

/// Signature shared by every registered mapper.
pub type MapperFn = fn(&RawRecord) -> UnifiedRecord;

/// `newfacade/LeetCodeDataset`.
pub fn map_leetcode(rec: &RawRecord) -> UnifiedRecord {
    let dataset_id = first_present(rec, &["question_id", "id"]);
    let title = first_present(rec, &["title", "question_title"]);
    UnifiedRecord {
        source: "LeetCodeDataset".to_string(),
        title: title_or_placeholder(title, "leetcode", &dataset_id, TITLE_PLACEHOLDER_SUFFIX),
        dataset_id,
        prompt: first_present(
            rec,
            &[
                "content",
                "translatedContent",
                "description",
                "question",
                "body",
                "prompt",
            ],
        ),
        solution: first_present(rec, &["solution", "accepted_answer", "reference_solution"]),
        language: String::new(),
        difficulty: first_present(rec, &["difficulty", "level"]),
        tags: list_text(rec.get("tags"), TAG_SEPARATOR),
        split: String::new(),
    }
}

/// `codeparrot/apps`. Solutions arrive as a list (or a JSON-encoded list).
pub fn map_apps(rec: &RawRecord) -> UnifiedRecord {
    let dataset_id = first_present(rec, &["problem_id", "id"]);
    let title = first_present(rec, &["title"]);
    let mut solution = list_text(rec.get("solutions"), SOLUTION_SEPARATOR);
    if solution.is_empty() {
        solution = first_present(rec, &["solution"]);
    }
    UnifiedRecord {
        source: "APPS".to_string(),
        title: title_or_placeholder(title, "apps", &dataset_id, TITLE_PLACEHOLDER_SUFFIX),
        dataset_id,
        prompt: first_present(rec, &["question", "prompt"]),
        solution,
        language: "python".to_string(),
        difficulty: first_present(rec, &["difficulty"]),
        tags: String::new(),
        split: String::new(),
    }
}

/// `DenCT/codeforces-problems-7k`. Ratings land in `difficulty`.
pub fn map_codeforces(rec: &RawRecord) -> UnifiedRecord {
    let dataset_id = first_present(rec, &["id", "problem_id"]);
    let title = first_present(rec, &["name", "title"]);
    UnifiedRecord {
        source: "Codeforces".to_string(),
        title: title_or_placeholder(title, "codeforces", &dataset_id, TITLE_PLACEHOLDER_SUFFIX),
        dataset_id,
        prompt: first_present(rec, &["statement", "prompt", "description"]),
        solution: String::new(),
        language: String::new(),
        difficulty: first_present(rec, &["rating", "difficulty"]),
        tags: list_text(rec.get("tags"), TAG_SEPARATOR),
        split: String::new(),
    }
}

/// `sentence-transformers/codesearchnet`: docstring as prompt, code as solution.
pub fn map_codesearchnet(rec: &RawRecord) -> UnifiedRecord {
    let dataset_id = first_present(rec, &["func_id", "id"]);
    let title = first_present(rec, &["func_name", "path"]);
    UnifiedRecord {
        source: "CodeSearchNet".to_string(),
        title: title_or_placeholder(title, "codesearchnet", &dataset_id, TITLE_PLACEHOLDER_SUFFIX),
        dataset_id,
        prompt: first_present(rec, &["docstring", "original_string"]),
        solution: first_present(rec, &["code"]),
        language: first_present(rec, &["language", "programming_language"]),
        difficulty: String::new(),
        tags: String::new(),
        split: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn leetcode_maps_content_and_tag_list() {
        let rec = raw(json!({
            "question_id": 42,
            "title": "Two Sum",
            "content": "Given an array of integers, return indices.",
            "difficulty": "Easy",
            "tags": ["Array", "Hash Table"]
        }));
        let mapped = map_leetcode(&rec);
        assert_eq!(mapped.source, "LeetCodeDataset");
        assert_eq!(mapped.dataset_id, "42");
        assert_eq!(mapped.title, "Two Sum");
        assert_eq!(mapped.difficulty, "Easy");
        assert_eq!(mapped.tags, "Array,Hash Table");
        assert_eq!(mapped.split, "");
    }

    #[test]
    fn leetcode_title_falls_back_to_question_id() {
        let rec = raw(json!({"question_id": "7", "content": "Reverse an integer."}));
        assert_eq!(map_leetcode(&rec).title, "leetcode_7");
        let anonymous = raw(json!({"content": "Reverse an integer."}));
        assert_eq!(map_leetcode(&anonymous).title, "leetcode_problem");
    }

    #[test]
    fn apps_joins_solution_lists_with_separator() {
        let rec = raw(json!({
            "problem_id": 3,
            "question": "Print the sum of two numbers.",
            "solutions": "[\"print(1+2)\", \"print(sum([1,2]))\"]",
            "difficulty": "interview"
        }));
        let mapped = map_apps(&rec);
        assert_eq!(mapped.solution, "print(1+2)\n\n---\n\nprint(sum([1,2]))");
        assert_eq!(mapped.language, "python");
        assert_eq!(mapped.dataset_id, "3");
        assert_eq!(mapped.title, "apps_3");
    }

    #[test]
    fn codeforces_uses_rating_as_difficulty() {
        let rec = raw(json!({
            "id": "1A",
            "name": "Theatre Square",
            "statement": "Pave the square with flagstones.",
            "rating": 1000,
            "tags": ["math"]
        }));
        let mapped = map_codeforces(&rec);
        assert_eq!(mapped.difficulty, "1000");
        assert_eq!(mapped.title, "Theatre Square");
        assert_eq!(mapped.tags, "math");
        assert_eq!(mapped.solution, "");
    }

    #[test]
    fn codesearchnet_prefers_docstring_and_func_name() {
        let rec = raw(json!({
            "func_name": "parse_args",
            "docstring": "Parse command-line arguments.",
            "code": "def parse_args(): ...",
            "language": "python"
        }));
        let mapped = map_codesearchnet(&rec);
        assert_eq!(mapped.title, "parse_args");
        assert_eq!(mapped.prompt, "Parse command-line arguments.");
        assert_eq!(mapped.solution, "def parse_args(): ...");
        assert_eq!(mapped.language, "python");
    }

    #[test]
    fn empty_records_still_map() {
        let empty = RawRecord::new();
        let mappers: [MapperFn; 4] = [map_leetcode, map_apps, map_codeforces, map_codesearchnet];
        for mapper in mappers {
            let mapped = mapper(&empty);
            assert!(mapped.prompt.is_empty());
            assert!(mapped.split.is_empty());
            assert!(!mapped.source.is_empty());
        }
    }
}
