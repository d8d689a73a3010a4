/*!

This is the long-form manual for `quota_allocation` and `fairquota`.

## The allocation method

The engine distributes a fixed total quota (the limit) across named units in
proportion to their signup counts, using the largest-remainder method (also
known as Hamilton apportionment):

1. Every unit receives the floor of its exact proportional share
   (`count * limit / total signups`).
2. The spots that flooring left unassigned are handed out one per unit to
   the largest fractional remainders, until the total matches the limit
   exactly.

Ties between equal remainders are resolved in favor of the unit that appears
first in the input. This makes the outcome fully deterministic: the same
unit list and limit always produce the same allocation.

Two shortcut cases bypass the method entirely:

* if there are no signups at all, or the limit is zero or negative, every
  unit receives nothing;
* if the total signups fit under the limit, every unit is fully granted.

## Using the library

The [Builder](crate::builder::Builder) is the recommended entry point.
The lower-level [run_allocation](crate::run_allocation) function accepts a
slice of [Unit](crate::Unit) directly; unit identifiers must then be unique,
which the caller is responsible for.

## Using the command line

`fairquota` reads a quota description and prints a JSON summary.

```bash
fairquota --config my_quota.json
```

The configuration is a JSON document:

```json
{
  "title": "2024 training seats",
  "totalLimit": 100,
  "units": [
    { "id": "1", "name": "Administration", "count": 45 },
    { "id": "2", "name": "Engineering", "count": 82 },
    { "id": "3", "name": "Quality", "count": 30 }
  ]
}
```

`totalLimit` may be given as a number or as a numeric string. Units may be
listed inline (as above), loaded from CSV files, or both:

```json
{
  "title": "2024 training seats",
  "totalLimit": 100,
  "unitFileSources": [
    {
      "provider": "csv",
      "filePath": "units.csv",
      "nameColumnIndex": 1,
      "countColumnIndex": 2,
      "firstRowIndex": 2
    }
  ]
}
```

Column and row indices are 1-based, following the usual spreadsheet
convention; `firstRowIndex: 2` skips a header row. An optional
`idColumnIndex` selects a column holding unit identifiers; without it, ids
are derived from the file name and the line number.

For quick runs without a configuration file, a CSV file of `name,count`
rows can be passed directly:

```bash
fairquota --input units.csv --limit 100
```

## Output

The summary is printed as pretty JSON. With `--out FILE` it is also written
to a file (`--out stdout` forces standard output only). With
`--reference FILE` the summary is compared against a previously recorded
summary and the run fails with a diff when they differ.

```json
{
  "config": { "title": "2024 training seats", "totalLimit": "100" },
  "summary": {
    "totalSignup": "157",
    "totalAllocated": "100",
    "excess": "57",
    "isOver": true
  },
  "allocations": [
    { "name": "Administration", "count": "45", "allocated": "29", "reduction": "16" }
  ]
}
```

The `allocations` list is ordered like the input units.

*/
