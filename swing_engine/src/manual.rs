/*!

This is the long-form manual for `swing_engine` and `swingometer`.

## The swing model

Starting from the results of a first-past-the-post election, a new party
appears and attracts a share of the voters of the existing parties. The share
is given per party, as a percentage between 0 and 100 (the *swing*).

In every constituency, a party with a swing of `s` keeps `votes * (1 - s/100)`
and gives `votes * s/100` to the new party. The new party collects the votes
given by all the parties. The parties without a swing keep their votes. The
total number of votes in a constituency never changes.

The winner of a constituency is the party with the most votes after the swing,
the new party included. If several parties have exactly the same number of
votes, the first one in column order wins. The columns are the party codes in
sorted order, followed by the new party.

The swing is always applied to the original results. Running the model twice
with the same swings gives exactly the same answer.

## Input formats

### Results

The election results are read from an Excel spreadsheet (`.xls` or `.xlsx`)
with one row per candidate. The first row holds the column names. The
following columns are used (the names can be changed in the configuration):

| column               | content                                     | required |
|----------------------|---------------------------------------------|----------|
| `Code`               | the code of the constituency                | yes      |
| `Party Abbreviation` | the party code of the candidate             | yes      |
| `Candidate Votes`    | the votes of the candidate                  | yes      |
| `Majority Party`     | the party code that won the constituency    | no       |
| `Constituency`       | the name of the constituency                | no       |
| `Region`             | the region                                  | no       |
| `County`             | the county                                  | no       |
| `Year`               | the year of the election                    | no       |

Only the parties that won at least one seat are kept. When the spreadsheet
contains several elections, use the `year` option to select one of them.

### Boundaries

The constituency boundaries are read from a GeoJSON `FeatureCollection`. Each
feature must carry the code of its constituency in its properties, under the
`id` key by default (`codeProperty` in the configuration). The geometry is
copied to the output without being interpreted.

## Configuration

All the options can be given in a JSON file with the `--config` flag:

```json
{
  "outputSettings": {
    "contestName": "2017 General Election",
    "outputPath": "summary.json",
    "mapOutputPath": "layers.json"
  },
  "resultsSource": {
    "provider": "excel",
    "filePath": "2017_General_Election_Results.xls",
    "year": 2017
  },
  "boundariesSource": {
    "filePath": "parliamentary_boundaries.json",
    "codeProperty": "id"
  },
  "swings": { "C": 10, "Lab": 5, "SNP": 0, "LD": 0, "Green": 0, "PC": 0 }
}
```

The file paths are relative to the directory of the configuration file. The
command line flags (`--input`, `--boundaries`, `--swing C=10`, `--year`, ...)
take precedence over the configuration file.

## Output

The summary is a JSON document with the number of seats per party before and
after the swing, and the winner of every constituency:

```json
{
  "config": { "contest": "2017 General Election", "swings": { "C": 10.0 } },
  "results": {
    "before": [ { "party": "Conservative", "seatsWon": 317 } ],
    "after": [ { "party": "Conservative", "seatsWon": 290 } ],
    "constituencies": { "E14000530": "C" }
  }
}
```

When the boundaries are provided, the map output holds one layer per winner:
`C`, `Lab`, `SNP`, `LD`, `Green`, `PC`, `New` and `other`. Each layer has a
colour and a GeoJSON `FeatureCollection` with the boundaries of the
constituencies won. Constituencies won by other parties, and boundaries with a
code that is not in the results, are drawn in the `other` layer.

*/
