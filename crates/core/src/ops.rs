//! Operation registry for the tree service API
//!
//! Every remote endpoint the adapter can reach is a variant of
//! [`ApiOperation`]: a tagged descriptor carrying the HTTP method and the
//! path template. Templates use `{name}` placeholders resolved per call;
//! resolution fails before any network I/O when a placeholder is left
//! unfilled.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use rootline_domain::{Result, RootlineError};

/// HTTP method of a logical operation.
///
/// Kept separate from any HTTP client type so the registry stays pure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Read operation; parameters travel as the query string.
    Get,
    /// Create operation; parameters travel as a JSON body.
    Post,
    /// Full-replace update; reconciled via merge-on-write before dispatch.
    Put,
    /// Delete operation.
    Delete,
}

impl HttpMethod {
    /// Canonical method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([^}]+)\}").expect("valid placeholder pattern")
});

/// Enumeration of all tree service API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation {
    // PEOPLE operations
    GetPeople,
    PostPeople,
    GetPerson,
    PutPerson,
    DeletePerson,
    GetPersonTimeline,
    GetPersonDnaMatches,

    // FAMILIES operations
    GetFamilies,
    PostFamilies,
    GetFamily,
    PutFamily,
    DeleteFamily,
    GetFamilyTimeline,

    // EVENTS operations
    GetEvents,
    PostEvents,
    GetEvent,
    PutEvent,
    DeleteEvent,
    GetEventSpan,

    // PLACES operations
    GetPlaces,
    PostPlaces,
    GetPlace,
    PutPlace,
    DeletePlace,

    // CITATIONS operations
    GetCitations,
    PostCitations,
    GetCitation,
    PutCitation,
    DeleteCitation,

    // SOURCES operations
    GetSources,
    PostSources,
    GetSource,
    PutSource,
    DeleteSource,

    // REPOSITORIES operations
    GetRepositories,
    PostRepositories,
    GetRepository,
    PutRepository,
    DeleteRepository,

    // MEDIA operations
    GetMedia,
    PostMedia,
    GetMediaItem,
    PutMediaItem,
    DeleteMediaItem,
    GetMediaFile,
    PutMediaFile,

    // NOTES operations
    GetNotes,
    PostNotes,
    GetNote,
    PutNote,
    DeleteNote,

    // TAGS operations
    GetTags,
    PostTags,
    GetTag,
    PutTag,
    DeleteTag,

    // SEARCH operations
    GetSearch,

    // ANALYSIS operations
    GetRelations,
    GetRelationsAll,
    GetLiving,
    GetLivingDates,
    GetTimelinesPeople,
    GetTimelinesFamilies,
    GetFacts,

    // MANAGEMENT operations
    GetTransactionsHistory,
    GetTransactionHistory,
    GetTypes,
    GetTypesDefault,
    GetTypesDefaultDatatype,
    GetTypesDefaultMap,

    // REPORTS operations
    GetReports,
    GetReport,
    GetReportFile,
    PostReportFile,
    GetReportProcessed,

    // TASK operations
    GetTaskStatus,

    // HOLIDAYS operations
    GetHolidays,
    GetHolidaysDate,

    // PARSERS operations
    PostParsersDnaMatch,

    // TREES operations
    GetTrees,
    GetTree,
}

impl ApiOperation {
    /// HTTP method for this operation.
    #[must_use]
    pub fn method(self) -> HttpMethod {
        match self {
            Self::PostPeople
            | Self::PostFamilies
            | Self::PostEvents
            | Self::PostPlaces
            | Self::PostCitations
            | Self::PostSources
            | Self::PostRepositories
            | Self::PostMedia
            | Self::PostNotes
            | Self::PostTags
            | Self::PostReportFile
            | Self::PostParsersDnaMatch => HttpMethod::Post,
            Self::PutPerson
            | Self::PutFamily
            | Self::PutEvent
            | Self::PutPlace
            | Self::PutCitation
            | Self::PutSource
            | Self::PutRepository
            | Self::PutMediaItem
            | Self::PutMediaFile
            | Self::PutNote
            | Self::PutTag => HttpMethod::Put,
            Self::DeletePerson
            | Self::DeleteFamily
            | Self::DeleteEvent
            | Self::DeletePlace
            | Self::DeleteCitation
            | Self::DeleteSource
            | Self::DeleteRepository
            | Self::DeleteMediaItem
            | Self::DeleteNote
            | Self::DeleteTag => HttpMethod::Delete,
            _ => HttpMethod::Get,
        }
    }

    /// Path template for this operation, relative to the API base.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::GetPeople | Self::PostPeople => "people/",
            Self::GetPerson | Self::PutPerson | Self::DeletePerson => "people/{handle}",
            Self::GetPersonTimeline => "people/{handle}/timeline",
            Self::GetPersonDnaMatches => "people/{handle}/dna/matches",
            Self::GetFamilies | Self::PostFamilies => "families/",
            Self::GetFamily | Self::PutFamily | Self::DeleteFamily => "families/{handle}",
            Self::GetFamilyTimeline => "families/{handle}/timeline",
            Self::GetEvents | Self::PostEvents => "events/",
            Self::GetEvent | Self::PutEvent | Self::DeleteEvent => "events/{handle}",
            Self::GetEventSpan => "events/{handle1}/span/{handle2}",
            Self::GetPlaces | Self::PostPlaces => "places/",
            Self::GetPlace | Self::PutPlace | Self::DeletePlace => "places/{handle}",
            Self::GetCitations | Self::PostCitations => "citations/",
            Self::GetCitation | Self::PutCitation | Self::DeleteCitation => "citations/{handle}",
            Self::GetSources | Self::PostSources => "sources/",
            Self::GetSource | Self::PutSource | Self::DeleteSource => "sources/{handle}",
            Self::GetRepositories | Self::PostRepositories => "repositories/",
            Self::GetRepository | Self::PutRepository | Self::DeleteRepository => {
                "repositories/{handle}"
            }
            Self::GetMedia | Self::PostMedia => "media/",
            Self::GetMediaItem | Self::PutMediaItem | Self::DeleteMediaItem => "media/{handle}",
            Self::GetMediaFile | Self::PutMediaFile => "media/{handle}/file",
            Self::GetNotes | Self::PostNotes => "notes/",
            Self::GetNote | Self::PutNote | Self::DeleteNote => "notes/{handle}",
            Self::GetTags | Self::PostTags => "tags/",
            Self::GetTag | Self::PutTag | Self::DeleteTag => "tags/{handle}",
            Self::GetSearch => "search/",
            Self::GetRelations => "relations/{handle1}/{handle2}",
            Self::GetRelationsAll => "relations/{handle1}/{handle2}/all",
            Self::GetLiving => "living/{handle}",
            Self::GetLivingDates => "living/{handle}/dates",
            Self::GetTimelinesPeople => "timelines/people",
            Self::GetTimelinesFamilies => "timelines/families",
            Self::GetFacts => "facts/",
            Self::GetTransactionsHistory => "transactions/history/",
            Self::GetTransactionHistory => "transactions/history/{transaction_id}/",
            Self::GetTypes => "types/",
            Self::GetTypesDefault => "types/default",
            Self::GetTypesDefaultDatatype => "types/default/{datatype}",
            Self::GetTypesDefaultMap => "types/default/{datatype}/map",
            Self::GetReports => "reports/",
            Self::GetReport => "reports/{report_id}",
            Self::GetReportFile | Self::PostReportFile => "reports/{report_id}/file",
            Self::GetReportProcessed => "reports/{report_id}/file/processed/{filename}",
            Self::GetTaskStatus => "tasks/{task_id}/",
            Self::GetHolidays => "holidays/",
            Self::GetHolidaysDate => "holidays/{country}/{year}/{month}/{day}",
            Self::PostParsersDnaMatch => "parsers/dna-match",
            Self::GetTrees => "trees/",
            Self::GetTree => "trees/{tree_id}",
        }
    }

    /// Placeholder names the template requires, in template order.
    #[must_use]
    pub fn path_param_names(self) -> Vec<&'static str> {
        PLACEHOLDER
            .captures_iter(self.endpoint())
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Whether parameters travel as a JSON body rather than a query string.
    ///
    /// The report-file POST is the one write that sends its options as
    /// query parameters.
    #[must_use]
    pub fn sends_body(self) -> bool {
        matches!(self.method(), HttpMethod::Post | HttpMethod::Put)
            && self != Self::PostReportFile
    }

    /// Whether this is a record update subject to merge-on-write.
    ///
    /// The media-file PUT replaces raw file content, not a JSON record, so
    /// it is excluded.
    #[must_use]
    pub fn is_update(self) -> bool {
        matches!(
            self,
            Self::PutPerson
                | Self::PutFamily
                | Self::PutEvent
                | Self::PutPlace
                | Self::PutCitation
                | Self::PutSource
                | Self::PutRepository
                | Self::PutMediaItem
                | Self::PutNote
                | Self::PutTag
        )
    }

    /// Resolve the path template against the supplied parameters.
    ///
    /// Substituted values are percent-encoded. Any placeholder still
    /// present after substitution fails with
    /// [`RootlineError::MissingPathParameter`].
    ///
    /// # Errors
    /// Returns `MissingPathParameter` naming the first unfilled placeholder.
    pub fn resolve_path(self, path_params: &BTreeMap<String, String>) -> Result<String> {
        let mut path = self.endpoint().to_string();
        for (name, value) in path_params {
            let placeholder = format!("{{{name}}}");
            if path.contains(&placeholder) {
                path = path.replace(&placeholder, &urlencoding::encode(value));
            }
        }

        if let Some(captures) = PLACEHOLDER.captures(&path) {
            let name = captures.get(1).map_or("", |m| m.as_str());
            return Err(RootlineError::MissingPathParameter(name.to_string()));
        }

        Ok(path)
    }
}
