//! Change detection for a single target.
//!
//! Priority order:
//! 1. `Last-Modified` header, unless the target overrides it or the header is
//!    missing/blank. No fingerprinting (and no element lookup) happens here.
//! 2. Fingerprint of the whole body, or of the element picked by the
//!    target's criteria.
//!
//! Mode is chosen from the current configuration every run. A field stored
//! under the other mode is left alone and never compared.

use std::borrow::Cow;

use crate::models::{
    CheckError, CheckMode, CheckResult, CheckStatus, FetchOutcome, FetchedPage, Target,
    TargetState,
};
use crate::services::fingerprint::fingerprint;
use crate::services::locator::{ElementLocator, HtmlLocator};

/// What a check concluded and how the stored record should change.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub result: CheckResult,
    /// Replacement record; `None` leaves the stored record untouched
    pub next_state: Option<TargetState>,
}

/// Classifies fetch results against prior state.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector<L = HtmlLocator> {
    locator: L,
}

impl<L: ElementLocator> ChangeDetector<L> {
    pub fn new(locator: L) -> Self {
        Self { locator }
    }

    /// Decide the outcome of one target's fetch.
    pub fn decide(
        &self,
        target: &Target,
        prior: Option<&TargetState>,
        fetched: Result<FetchOutcome, CheckError>,
    ) -> Decision {
        let previously_failed = prior.is_some_and(|state| state.last_error);
        let result = |status: CheckStatus, mode: Option<CheckMode>| CheckResult {
            name: target.name.clone(),
            status,
            mode,
            previously_failed,
        };

        let page = match fetched {
            Ok(FetchOutcome::Fetched(page)) => page,
            Ok(FetchOutcome::NotModified) => {
                log::debug!("{}: server answered 304 Not Modified", target.name);
                let mut next = prior.cloned().unwrap_or_default();
                next.last_error = false;
                return Decision {
                    result: result(CheckStatus::Unmodified, Some(CheckMode::LastModified)),
                    next_state: Some(next),
                };
            }
            Err(error) => {
                log::warn!("{}: {}", target.name, error);
                return Decision {
                    result: result(CheckStatus::Error(error), None),
                    next_state: Some(Self::flag_failure(prior)),
                };
            }
        };

        let header = page.last_modified().filter(|_| target.header_mode_allowed());
        if let Some(value) = header {
            let (status, next) = Self::compare_header(prior, value);
            log::debug!("{}: header mode -> {:?}", target.name, status);
            return Decision {
                result: result(status, Some(CheckMode::LastModified)),
                next_state: Some(next),
            };
        }

        match self.compare_fingerprint(target, prior, &page) {
            Ok((status, next)) => {
                log::debug!("{}: fingerprint mode -> {:?}", target.name, status);
                Decision {
                    result: result(status, Some(CheckMode::Fingerprint)),
                    next_state: Some(next),
                }
            }
            Err(error) => {
                log::warn!("{}: {}", target.name, error);
                Decision {
                    result: result(CheckStatus::Error(error), Some(CheckMode::Fingerprint)),
                    next_state: Some(Self::flag_failure(prior)),
                }
            }
        }
    }

    /// Keep comparison history; only flag the failure.
    fn flag_failure(prior: Option<&TargetState>) -> TargetState {
        let mut next = prior.cloned().unwrap_or_default();
        next.last_error = true;
        next
    }

    fn compare_header(prior: Option<&TargetState>, value: &str) -> (CheckStatus, TargetState) {
        let stored = prior.and_then(|state| state.last_modified.as_deref());
        let status = match stored {
            None => CheckStatus::FirstRun,
            Some(previous) if previous == value => CheckStatus::Unmodified,
            Some(_) => CheckStatus::ModifiedWithTimestamp(value.to_string()),
        };

        let mut next = prior.cloned().unwrap_or_default();
        next.last_modified = Some(value.to_string());
        next.last_error = false;
        (status, next)
    }

    fn compare_fingerprint(
        &self,
        target: &Target,
        prior: Option<&TargetState>,
        page: &FetchedPage,
    ) -> Result<(CheckStatus, TargetState), CheckError> {
        let content: Cow<'_, [u8]> = match &target.criteria {
            None => Cow::Borrowed(page.body.as_slice()),
            Some(criterion) => {
                let markup = self
                    .locator
                    .locate(&page.text(), criterion)
                    .ok_or_else(|| CheckError::ElementNotFound {
                        criterion: criterion.to_string(),
                    })?;
                Cow::Owned(markup.into_bytes())
            }
        };

        let digest = fingerprint(&content);
        let stored = prior.and_then(|state| state.hash.as_deref());
        let status = match stored {
            None => CheckStatus::FirstRun,
            Some(previous) if previous == digest => CheckStatus::Unmodified,
            Some(_) => CheckStatus::ModifiedByHash,
        };

        let mut next = prior.cloned().unwrap_or_default();
        next.hash = Some(digest);
        next.last_error = false;
        Ok((status, next))
    }
}
