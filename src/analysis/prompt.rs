//! Prompt construction and size estimation
//!
//! The prompt is assembled from fixed sections: role, task, search summary,
//! page summary, option-driven requirements and the expected output format.

use crate::fetch::{FetchSummary, FetchedPage};
use crate::model::AnalysisOptions;
use crate::search::SearchResults;
use std::fmt::Write;

/// Pages described in full in the prompt
pub const MAX_PROMPT_PAGES: usize = 5;

/// Sub-headings listed per page
pub const MAX_PROMPT_HEADINGS: usize = 10;

/// Related searches listed in the search section
pub const MAX_RELATED_SEARCHES: usize = 5;

/// Pages kept when the prompt has to be truncated
pub const TRUNCATED_PAGES: usize = 3;

/// Sub-headings kept per page when the prompt has to be truncated
pub const TRUNCATED_HEADINGS: usize = 5;

/// Report sections the output is expected to contain
pub const REQUIRED_SECTIONS: &[&str] = &[
    "# SEO Analysis Report",
    "## 1. Overview",
    "## 2. Search Results Analysis",
];

const SYSTEM_SECTION: &str = "You are a senior SEO specialist and content strategist with more than ten years of search engine optimization experience.

## Your expertise
1. Analyzing competitor strategies on search engine result pages
2. Identifying search intent and trends behind a topic
3. Giving concrete, actionable optimization advice
4. Designing content strategies that fit a target audience

## Your task
Using the real search results and competitor page data below, write a practical SEO analysis report for the given topic and audience.

## Principles
- Ground every statement in the provided data
- Give specific recommendations and next steps
- Consider the audience's search intent and needs
- Point out gaps and opportunities in the competition";

const OUTPUT_FORMAT_SECTION: &str = "## Output format

Write the complete report in Markdown, following this structure exactly:

# SEO Analysis Report

## 1. Overview
- Search intent behind the topic
- How competitive the results are
- Fit with the target audience

## 2. Search Results Analysis
- Strategies of the top 5 competitors
- Title length and keyword usage patterns
- Snippet writing patterns
- Observations on domain authority

## 3. Content Strategy
- Recommended titles (3-5 options)
- Meta description advice
- Content structure (H1, H2, H3)
- Target word count

## 4. Keyword Strategy
- Primary keyword optimization
- Related keyword expansion
- Long-tail opportunities
- Semantically related terms

## 5. Competitive Advantage
- Differentiation opportunities
- Competitor weaknesses
- Unserved gaps
- How to outrank the current results

## 6. Action Plan
- Top 3 priorities
- Content production timeline
- Success metrics
- Follow-up optimization

[Add the extra sections requested above: draft, FAQ, comparison table]

**Important**: every recommendation must be based on the data provided and be specific enough to act on.";

/// Page fields that go into the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDigest {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub primary_heading: Option<String>,
    pub sub_headings: Vec<String>,
    pub word_count: usize,
    pub structural_units: usize,
}

impl From<&FetchedPage> for PageDigest {
    fn from(page: &FetchedPage) -> Self {
        Self {
            url: page.url.clone(),
            title: page.title.clone(),
            description: page.description.clone(),
            primary_heading: page.primary_heading.clone(),
            sub_headings: page.sub_headings.clone(),
            word_count: page.word_count,
            structural_units: page.structural_units,
        }
    }
}

/// The part of a [`FetchSummary`] that the prompt describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchDigest {
    pub total: usize,
    pub successful: usize,
    pub avg_word_count: usize,
    pub avg_structural_units: usize,
    /// Successful pages only, in submission order
    pub pages: Vec<PageDigest>,
}

impl FetchDigest {
    pub fn from_summary(summary: &FetchSummary) -> Self {
        Self {
            total: summary.total,
            successful: summary.successful,
            avg_word_count: summary.avg_word_count,
            avg_structural_units: summary.avg_structural_units,
            pages: summary.successful_pages().map(PageDigest::from).collect(),
        }
    }

    /// Keeps at most `max_pages` pages with at most `max_headings` sub-headings each
    pub fn truncated(&self, max_pages: usize, max_headings: usize) -> Self {
        let pages = self
            .pages
            .iter()
            .take(max_pages)
            .map(|page| {
                let mut page = page.clone();
                page.sub_headings.truncate(max_headings);
                page
            })
            .collect();

        Self {
            pages,
            ..self.clone()
        }
    }
}

/// Estimated size of a prompt in work units (UTF-8 bytes / 3)
pub fn estimate_units(prompt: &str) -> usize {
    prompt.len() / 3
}

/// Assembles the full prompt
pub fn build_prompt(
    topic: &str,
    audience: &str,
    search: &SearchResults,
    fetch: &FetchDigest,
    options: AnalysisOptions,
) -> String {
    [
        SYSTEM_SECTION.to_string(),
        task_section(topic, audience),
        search_section(topic, search),
        fetch_section(fetch),
        options_section(options),
        OUTPUT_FORMAT_SECTION.to_string(),
    ]
    .join("\n\n")
}

fn task_section(topic: &str, audience: &str) -> String {
    format!(
        "## Task\n\n**Topic**: {}\n**Target audience**: {}\n\nAnalyze this topic for this audience using the data below.",
        topic, audience
    )
}

fn search_section(topic: &str, search: &SearchResults) -> String {
    let mut text = String::new();
    let _ = write!(
        text,
        "## Search Results\n\n**Query**: {}\n**Estimated total results**: {}\n**Results analyzed**: {}\n\n### Top {} results:\n",
        topic,
        search.total_estimate,
        search.items.len(),
        search.items.len()
    );

    for item in &search.items {
        let _ = write!(
            text,
            "\n**#{}**:\n- Title: {}\n- URL: {}\n- Snippet: {}\n",
            item.rank, item.title, item.url, item.snippet
        );
    }

    if !search.related_searches.is_empty() {
        text.push_str("\n### Related searches:\n");
        for (i, related) in search
            .related_searches
            .iter()
            .take(MAX_RELATED_SEARCHES)
            .enumerate()
        {
            let _ = writeln!(text, "{}. {}", i + 1, related);
        }
    }

    text
}

fn fetch_section(fetch: &FetchDigest) -> String {
    let mut text = String::new();
    let _ = write!(
        text,
        "## Competitor Pages\n\n**Fetch statistics**:\n- Pages attempted: {}\n- Pages retrieved: {}\n- Average word count: {}\n- Average paragraph count: {}\n",
        fetch.total, fetch.successful, fetch.avg_word_count, fetch.avg_structural_units
    );

    if fetch.pages.is_empty() {
        text.push_str(
            "\nNo competitor pages could be retrieved. Base the analysis on the search results alone.\n",
        );
        return text;
    }

    text.push_str("\n### Retrieved pages:\n");
    for (i, page) in fetch.pages.iter().take(MAX_PROMPT_PAGES).enumerate() {
        let shown: Vec<&str> = page
            .sub_headings
            .iter()
            .take(MAX_PROMPT_HEADINGS)
            .map(String::as_str)
            .collect();
        let more = if page.sub_headings.len() > MAX_PROMPT_HEADINGS {
            "..."
        } else {
            ""
        };

        let _ = write!(
            text,
            "\n**Page {}**: {}\n- Title: {}\n- Meta description: {}\n- H1: {}\n- H2 ({}): {}{}\n- Words: {}, paragraphs: {}\n",
            i + 1,
            page.url,
            page.title.as_deref().unwrap_or("n/a"),
            page.description.as_deref().unwrap_or("n/a"),
            page.primary_heading.as_deref().unwrap_or("n/a"),
            page.sub_headings.len(),
            shown.join(", "),
            more,
            page.word_count,
            page.structural_units
        );
    }

    text
}

fn options_section(options: AnalysisOptions) -> String {
    let mut lines = vec!["## Additional requirements"];

    if options.generate_draft {
        lines.push("- Include a first content draft");
    }
    if options.include_faq {
        lines.push("- Include FAQ suggestions");
    }
    if options.include_table {
        lines.push("- Include a comparison table");
    }

    lines.join("\n")
}
