//! Filter chains.

use crate::context::{ActionExecutingContext, ResourceExecutingContext, ResultExecutingContext};
use crate::filter::{AsyncAuthorizationFilter, AsyncExceptionFilter, AsyncFilter, Filter, FilterDescriptor};
use praxis_core::FilterCategory;
use std::fmt;
use std::sync::Arc;

/// Filters of one action, classified by category.
///
/// Within a category filters keep the order of their descriptors (stable by
/// [`FilterDescriptor::order`]); across categories the structural position
/// is fixed no matter where a filter was declared.
///
/// # Example
///
/// ```
/// use praxis_core::FilterCategory;
/// use praxis_pipeline::{ActionExecutingContext, Filter, FilterChain, FilterDescriptor, SyncFilter};
///
/// struct Audit;
/// impl SyncFilter<ActionExecutingContext> for Audit {}
///
/// struct Timing;
/// impl SyncFilter<ActionExecutingContext> for Timing {}
///
/// let chain = FilterChain::new([
///     FilterDescriptor::new(Filter::action(Audit)),
///     FilterDescriptor::new(Filter::action(Timing)).with_order(-1),
/// ]);
///
/// let names = chain.names(FilterCategory::Action);
/// assert!(names[0].ends_with("Timing"));
/// assert!(names[1].ends_with("Audit"));
/// ```
#[derive(Clone, Default)]
pub struct FilterChain {
    authorization: Vec<Arc<dyn AsyncAuthorizationFilter>>,
    resource: Vec<Arc<dyn AsyncFilter<ResourceExecutingContext>>>,
    action: Vec<Arc<dyn AsyncFilter<ActionExecutingContext>>>,
    exception: Vec<Arc<dyn AsyncExceptionFilter>>,
    result: Vec<Arc<dyn AsyncFilter<ResultExecutingContext>>>,
}

impl FilterChain {
    /// Classifies `descriptors` into a chain.
    pub fn new<I>(descriptors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FilterDescriptor>,
    {
        let mut descriptors: Vec<FilterDescriptor> =
            descriptors.into_iter().map(Into::into).collect();
        descriptors.sort_by_key(FilterDescriptor::order);

        let mut chain = Self::default();
        for descriptor in descriptors {
            match descriptor.into_filter() {
                Filter::Authorization(filter) => chain.authorization.push(filter),
                Filter::Resource(filter) => chain.resource.push(filter),
                Filter::Action(filter) => chain.action.push(filter),
                Filter::Exception(filter) => chain.exception.push(filter),
                Filter::Result(filter) => chain.result.push(filter),
            }
        }
        chain
    }

    /// Authorization filters, in run order.
    pub fn authorization(&self) -> &[Arc<dyn AsyncAuthorizationFilter>] {
        &self.authorization
    }

    /// Resource filters, outermost first.
    pub fn resource(&self) -> &[Arc<dyn AsyncFilter<ResourceExecutingContext>>] {
        &self.resource
    }

    /// Action filters, outermost first.
    pub fn action(&self) -> &[Arc<dyn AsyncFilter<ActionExecutingContext>>] {
        &self.action
    }

    /// Exception filters in declaration order. They run in reverse.
    pub fn exception(&self) -> &[Arc<dyn AsyncExceptionFilter>] {
        &self.exception
    }

    /// Result filters, outermost first.
    pub fn result(&self) -> &[Arc<dyn AsyncFilter<ResultExecutingContext>>] {
        &self.result
    }

    /// Names of the filters in `category`, in declaration order.
    pub fn names(&self, category: FilterCategory) -> Vec<&str> {
        match category {
            FilterCategory::Authorization => self.authorization.iter().map(|f| f.name()).collect(),
            FilterCategory::Resource => self.resource.iter().map(|f| f.name()).collect(),
            FilterCategory::Action => self.action.iter().map(|f| f.name()).collect(),
            FilterCategory::Exception => self.exception.iter().map(|f| f.name()).collect(),
            FilterCategory::Result => self.result.iter().map(|f| f.name()).collect(),
        }
    }

    /// Number of filters in `category`.
    pub fn len(&self, category: FilterCategory) -> usize {
        match category {
            FilterCategory::Authorization => self.authorization.len(),
            FilterCategory::Resource => self.resource.len(),
            FilterCategory::Action => self.action.len(),
            FilterCategory::Exception => self.exception.len(),
            FilterCategory::Result => self.result.len(),
        }
    }

    /// Returns true if the chain holds no filters at all.
    pub fn is_empty(&self) -> bool {
        FilterCategory::ALL
            .iter()
            .all(|category| self.len(*category) == 0)
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for category in FilterCategory::ALL {
            map.entry(&category.name(), &self.names(category));
        }
        map.finish()
    }
}
