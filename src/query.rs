//
// query.rs
// Dicom-Catalog-rs
//
// Canonical filter+page state with a lossless key/value location representation and pagination math.
//
// Thales Matheus Mendonça Santos - November 2025

/// Rows per page; the service caps page_size at 100 but the UI always asks for 20.
pub const PAGE_SIZE: u32 = 20;

/// The four filterable fields of the series table.
///
/// Always fully defined: an empty string means "no constraint", never a
/// missing key. This is what lets the state round-trip losslessly through the
/// string-keyed location representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub patient_id: String,
    pub patient_name: String,
    pub modality: String,
    pub protocol_name: String,
}

impl FilterState {
    /// Fields that actually constrain the query, in a fixed order.
    /// Empty fields are omitted, matching the wire contract.
    pub fn active_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = Vec::new();
        if !self.patient_id.is_empty() {
            fields.push(("patient_id", self.patient_id.as_str()));
        }
        if !self.patient_name.is_empty() {
            fields.push(("patient_name", self.patient_name.as_str()));
        }
        if !self.modality.is_empty() {
            fields.push(("modality", self.modality.as_str()));
        }
        if !self.protocol_name.is_empty() {
            fields.push(("protocol_name", self.protocol_name.as_str()));
        }
        fields
    }
}

/// Partial filter update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct FilterPatch {
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub modality: Option<String>,
    pub protocol_name: Option<String>,
}

/// 1-based page position. `page_size` is fixed; only `page` varies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PAGE_SIZE,
        }
    }
}

impl PageState {
    /// Offset of the first row of this page, for the bounded list request.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// Derive the page-control view for a given total count.
    ///
    /// An empty result set still renders as one page so the control never
    /// shows "page 1 of 0".
    pub fn paginate(&self, total: u64) -> Pagination {
        let total_pages = (total.div_ceil(u64::from(self.page_size)) as u32).max(1);
        Pagination {
            page: self.page,
            total_pages,
            total,
            has_prev: self.page > 1,
            has_next: self.page < total_pages,
        }
    }
}

/// Everything the page control needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Pagination {
    /// The label of the original UI, e.g. "第 1 / 3 页".
    pub fn label(&self) -> String {
        format!("第 {} / {} 页", self.page, self.total_pages)
    }
}

/// Owner of the canonical filter+page state.
///
/// Purely synchronous: no network access and no failure modes. All derivation
/// rules (page reset on filter change) live here as explicit functions rather
/// than as side effects of a UI layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub filters: FilterState,
    pub page: PageState,
}

impl QueryState {
    /// Apply a filter update. Any filter change resets the page to 1 so a
    /// narrowed result set cannot leave the view on an out-of-range page.
    pub fn set_filters(&mut self, patch: FilterPatch) -> &FilterState {
        if let Some(v) = patch.patient_id {
            self.filters.patient_id = v;
        }
        if let Some(v) = patch.patient_name {
            self.filters.patient_name = v;
        }
        if let Some(v) = patch.modality {
            self.filters.modality = v;
        }
        if let Some(v) = patch.protocol_name {
            self.filters.protocol_name = v;
        }
        self.page.page = 1;
        &self.filters
    }

    /// Move to page `n`. Pages are 1-based; zero is clamped up.
    pub fn set_page(&mut self, n: u32) -> &PageState {
        self.page.page = n.max(1);
        &self.page
    }

    /// Serialize to the shareable location pairs.
    ///
    /// Empty filter fields and page 1 are omitted so the representation is a
    /// pure function of the state: `parse(serialize(q)) == q` and a second
    /// serialize yields the same pairs.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .active_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if self.page.page > 1 {
            pairs.push(("page".to_string(), self.page.page.to_string()));
        }
        pairs
    }

    /// Rebuild state from location pairs, order-insensitive.
    ///
    /// Missing keys default to "no constraint" / page 1; an unparseable or
    /// zero page also falls back to 1. Unknown keys are ignored.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut state = Self::default();
        for (key, value) in pairs {
            match key {
                "patient_id" => state.filters.patient_id = value.to_string(),
                "patient_name" => state.filters.patient_name = value.to_string(),
                "modality" => state.filters.modality = value.to_string(),
                "protocol_name" => state.filters.protocol_name = value.to_string(),
                "page" => {
                    state.page.page = value.parse::<u32>().unwrap_or(1).max(1);
                }
                _ => {}
            }
        }
        state
    }
}
