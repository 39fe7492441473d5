//! Text rendering of allocation tables.

use std::io::{self, Write};

use banker_core::allocation::{Units, api::Snapshot};

/// Resource type names: `A` to `Z`, then `R26`, `R27`...
pub fn resource_names(resources: usize) -> Vec<String> {
    (0..resources)
        .map(|r| match u8::try_from(r) {
            Ok(offset) if offset < 26 => char::from(b'A' + offset).to_string(),
            _ => format!("R{r}"),
        })
        .collect()
}

/// `0, 2, 3` style list of customer indices, or `none`.
pub fn customer_list(customers: &[usize]) -> String {
    if customers.is_empty() {
        return "none".to_string();
    }
    customers.iter().map(usize::to_string).collect::<Vec<_>>().join(", ")
}

fn row(values: &[Units], width: usize) -> String {
    values.iter().map(|v| format!("{v:>width$}")).collect::<Vec<_>>().join(" ")
}

/// Write the available vector and the maximum, allocation and need tables
/// side by side, one line per customer.
pub fn write_snapshot<W: Write>(out: &mut W, snapshot: &Snapshot, names: &[String]) -> io::Result<()> {
    let width = snapshot
        .maximum
        .iter()
        .flatten()
        .chain(&snapshot.available)
        .map(|v| v.to_string().len())
        .chain(names.iter().map(String::len))
        .max()
        .unwrap_or(1);
    let header = names.iter().map(|n| format!("{n:>width$}")).collect::<Vec<_>>().join(" ");
    let label_width = format!("Customer {}", snapshot.maximum.len().saturating_sub(1)).len();

    writeln!(out)?;
    writeln!(out, "Current System State:")?;
    writeln!(out, "{:label_width$}  {}", "", header)?;
    writeln!(out, "{:label_width$}  {}", "Available", row(&snapshot.available, width))?;
    writeln!(out)?;
    writeln!(
        out,
        "{:label_width$}  {:block$}   {:block$}   {:block$}",
        "",
        "Maximum",
        "Allocation",
        "Need",
        block = header.len()
    )?;
    writeln!(
        out,
        "{:label_width$}  {:block$}   {:block$}   {:block$}",
        "",
        header,
        header,
        header,
        block = header.len()
    )?;
    for (customer, ((max, held), need)) in
        snapshot.maximum.iter().zip(&snapshot.allocation).zip(&snapshot.need).enumerate()
    {
        writeln!(
            out,
            "{:label_width$}  {}   {}   {}",
            format!("Customer {customer}"),
            row(max, width),
            row(held, width),
            row(need, width)
        )?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names() {
        assert_eq!(resource_names(4), vec!["A", "B", "C", "D"]);
        assert_eq!(resource_names(28)[26], "R26");
    }

    #[test]
    fn test_customer_list() {
        assert_eq!(customer_list(&[0, 2, 3]), "0, 2, 3");
        assert_eq!(customer_list(&[]), "none");
    }

    #[test]
    fn test_write_snapshot() {
        let snapshot = Snapshot {
            available: vec![2, 10],
            maximum: vec![vec![4, 1], vec![7, 12]],
            allocation: vec![vec![3, 1], vec![2, 0]],
            need: vec![vec![1, 0], vec![5, 12]],
        };
        let mut out = Vec::new();
        write_snapshot(&mut out, &snapshot, &resource_names(2)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Available    2 10"));
        assert!(text.contains("Customer 0   4  1    3  1    1  0"));
        assert!(text.contains("Customer 1   7 12    2  0    5 12"));
    }
}
