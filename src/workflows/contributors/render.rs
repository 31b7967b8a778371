use std::fmt::Write as _;

use super::domain::Contributor;
use crate::config::ContributorsTableConfig;

const PROFILE_BASE_URL: &str = "https://crowdin.com/profile/";

/// Renders the contributor grid. Output depends only on the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRenderer {
    contributors_per_line: usize,
    image_size: u32,
    link_profiles: bool,
}

impl TableRenderer {
    pub fn new(contributors_per_line: usize, image_size: u32, link_profiles: bool) -> Self {
        Self {
            contributors_per_line: contributors_per_line.max(1),
            image_size,
            link_profiles,
        }
    }

    /// Organization projects have no public profile pages, so links are dropped.
    pub fn from_config(config: &ContributorsTableConfig, organization: Option<&str>) -> Self {
        Self::new(
            config.contributors_per_line,
            config.image_size,
            organization.is_none(),
        )
    }

    pub fn render(&self, contributors: &[Contributor]) -> String {
        let mut html = String::from("<table>\n");

        for row in contributors.chunks(self.contributors_per_line) {
            html.push_str("  <tr>\n");
            for contributor in row {
                self.render_cell(&mut html, contributor);
            }
            html.push_str("  </tr>\n");
        }

        html.push_str("</table>");
        html
    }

    fn render_cell(&self, html: &mut String, contributor: &Contributor) {
        let image = format!(
            "<img style=\"width: {}px\" src=\"{}\" alt=\"{}\"/>",
            self.image_size,
            escape_html(&contributor.picture),
            escape_html(&contributor.username)
        );

        html.push_str("    <td style=\"text-align:center; vertical-align: top;\">\n");
        if self.link_profiles {
            writeln!(
                html,
                "      <a href=\"{}{}\">{}</a>",
                PROFILE_BASE_URL,
                escape_html(&contributor.username),
                image
            )
            .expect("write profile link");
        } else {
            writeln!(html, "      {}", image).expect("write avatar");
        }
        html.push_str("      <br />\n");
        writeln!(
            html,
            "      <sub><b>{}</b></sub>",
            escape_html(&contributor.name)
        )
        .expect("write name");
        html.push_str("      <br />\n");
        writeln!(html, "      <sub><b>{} words</b></sub>", contributor.words())
            .expect("write word count");
        html.push_str("    </td>\n");
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
