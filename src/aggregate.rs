use crate::value::TypedValue;
use fnv::FnvBuildHasher;
use hashbrown::HashMap;

/// Running statistics for one metric of one call site.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregate {
    sum: TypedValue,
    count: u64,
}

impl Aggregate {
    /// Gets the running sum.
    pub fn sum(&self) -> &TypedValue { &self.sum }

    /// Gets how many values were summed.
    pub fn count(&self) -> u64 { self.count }

    /// Gets the mean of the summed values.
    pub fn mean(&self) -> TypedValue { self.sum.mean(self.count) }
}

/// Aggregated metrics for one call site.
///
/// Metric order is fixed by the first report seen for the call site.  Metrics appearing only in
/// later reports are appended after it.
#[derive(Debug)]
pub struct CallSite {
    name: String,
    calls: u64,
    index: HashMap<String, usize, FnvBuildHasher>,
    metrics: Vec<(String, Aggregate)>,
}

impl CallSite {
    fn new(name: &str) -> CallSite {
        CallSite {
            name: name.to_owned(),
            calls: 0,
            index: HashMap::default(),
            metrics: Vec::new(),
        }
    }

    fn update(&mut self, names: &[String], values: &[TypedValue]) {
        self.calls += 1;

        for (name, value) in names.iter().zip(values) {
            let idx = match self.index.get(name.as_str()) {
                Some(idx) => *idx,
                None => {
                    let sum = match value.zero() {
                        Some(sum) => sum,
                        None => continue,
                    };
                    let idx = self.metrics.len();
                    self.metrics.push((name.clone(), Aggregate { sum, count: 0 }));
                    self.index.insert(name.clone(), idx);
                    idx
                },
            };

            let aggregate = &mut self.metrics[idx].1;
            if aggregate.sum.accumulate(value) {
                aggregate.count += 1;
            }
        }
    }

    /// Gets the call site name.
    pub fn name(&self) -> &str { &self.name }

    /// Gets how many reports were aggregated for this call site.
    ///
    /// This is tracked independently of the per-metric counts, which can lag behind if a report
    /// carried a value of an unexpected type.
    pub fn calls(&self) -> u64 { self.calls }

    /// Gets the aggregate for a metric.
    pub fn get(&self, metric: &str) -> Option<&Aggregate> { self.index.get(metric).map(|idx| &self.metrics[*idx].1) }

    /// Iterates the metrics in their canonical order.
    pub fn metrics(&self) -> impl Iterator<Item = (&str, &Aggregate)> {
        self.metrics.iter().map(|(name, aggregate)| (name.as_str(), aggregate))
    }
}

/// Metric statistics keyed by call site, then by metric name.
///
/// Call sites are kept in the order they were first seen.  The table only ever grows.
#[derive(Debug, Default)]
pub struct Aggregations {
    index: HashMap<String, usize, FnvBuildHasher>,
    call_sites: Vec<CallSite>,
}

impl Aggregations {
    /// Creates an empty table.
    pub fn new() -> Aggregations { Default::default() }

    /// Adds one report's values under `call_site`.
    ///
    /// `names` and `values` are positionally aligned.  Values that do not aggregate, such as
    /// strings, are skipped.
    pub fn aggregate(&mut self, call_site: &str, names: &[String], values: &[TypedValue]) {
        let idx = match self.index.get(call_site) {
            Some(idx) => *idx,
            None => {
                let idx = self.call_sites.len();
                self.call_sites.push(CallSite::new(call_site));
                self.index.insert(call_site.to_owned(), idx);
                idx
            },
        };

        self.call_sites[idx].update(names, values);
    }

    /// Whether nothing has been aggregated yet.
    pub fn is_empty(&self) -> bool { self.call_sites.is_empty() }

    /// Gets the number of distinct call sites.
    pub fn len(&self) -> usize { self.call_sites.len() }

    /// Gets the aggregates for a call site.
    pub fn call_site(&self, name: &str) -> Option<&CallSite> { self.index.get(name).map(|idx| &self.call_sites[*idx]) }

    /// Gets the aggregate for one metric of one call site.
    pub fn get(&self, call_site: &str, metric: &str) -> Option<&Aggregate> {
        self.call_site(call_site).and_then(|cs| cs.get(metric))
    }

    /// Iterates call sites in the order they were first seen.
    pub fn call_sites(&self) -> impl Iterator<Item = &CallSite> { self.call_sites.iter() }
}

#[cfg(test)]
mod tests {
    use super::Aggregations;
    use crate::value::TypedValue;

    fn names(names: &[&str]) -> Vec<String> { names.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn test_sum_and_count() {
        let mut aggs = Aggregations::new();
        let metrics = names(&["A"]);
        for v in &[2, 4, 6] {
            aggs.aggregate("foo", &metrics, &[TypedValue::U64(*v)]);
        }

        let agg = aggs.get("foo", "A").unwrap();
        assert_eq!(agg.sum(), &TypedValue::U64(12));
        assert_eq!(agg.count(), 3);
        assert_eq!(agg.mean(), TypedValue::U64(4));
        assert_eq!(aggs.call_site("foo").unwrap().calls(), 3);
    }

    #[test]
    fn test_call_site_order() {
        let mut aggs = Aggregations::new();
        let metrics = names(&["A"]);
        aggs.aggregate("zeta", &metrics, &[TypedValue::U32(1)]);
        aggs.aggregate("alpha", &metrics, &[TypedValue::U32(1)]);
        aggs.aggregate("zeta", &metrics, &[TypedValue::U32(1)]);
        aggs.aggregate("mid", &metrics, &[TypedValue::U32(1)]);

        let order: Vec<&str> = aggs.call_sites().map(|cs| cs.name()).collect();
        assert_eq!(order, vec!["zeta", "alpha", "mid"]);
        assert_eq!(aggs.len(), 3);
    }

    #[test]
    fn test_metric_order_fixed_by_first_report() {
        let mut aggs = Aggregations::new();
        aggs.aggregate(
            "foo",
            &names(&["GpuTime", "EuActive", "EuStall"]),
            &[TypedValue::U64(10), TypedValue::F32(50.0), TypedValue::F32(5.0)],
        );
        aggs.aggregate(
            "foo",
            &names(&["EuStall", "GpuTime", "Extra"]),
            &[TypedValue::F32(7.0), TypedValue::U64(30), TypedValue::U32(1)],
        );

        let cs = aggs.call_site("foo").unwrap();
        let order: Vec<&str> = cs.metrics().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["GpuTime", "EuActive", "EuStall", "Extra"]);
        assert_eq!(cs.get("GpuTime").unwrap().mean(), TypedValue::U64(20));
        assert_eq!(cs.get("EuActive").unwrap().count(), 1);
        assert_eq!(cs.get("EuStall").unwrap().mean(), TypedValue::F32(6.0));
    }

    #[test]
    fn test_text_values_are_skipped() {
        let mut aggs = Aggregations::new();
        aggs.aggregate(
            "foo",
            &names(&["Name", "A"]),
            &[TypedValue::Text("gpu".to_owned()), TypedValue::U32(3)],
        );

        let cs = aggs.call_site("foo").unwrap();
        assert!(cs.get("Name").is_none());
        assert_eq!(cs.metrics().count(), 1);
        assert_eq!(cs.calls(), 1);
    }

    #[test]
    fn test_mismatched_value_type_does_not_count() {
        let mut aggs = Aggregations::new();
        let metrics = names(&["A"]);
        aggs.aggregate("foo", &metrics, &[TypedValue::U32(4)]);
        aggs.aggregate("foo", &metrics, &[TypedValue::F32(1.0)]);

        let cs = aggs.call_site("foo").unwrap();
        assert_eq!(cs.calls(), 2);
        assert_eq!(cs.get("A").unwrap().count(), 1);
        assert_eq!(cs.get("A").unwrap().sum(), &TypedValue::U32(4));
    }
}
