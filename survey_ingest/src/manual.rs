/*!

This is the long-form manual for `survey_ingest` and `survey-digest`.

## Sheet layouts

The layout of a sheet is always declared, it is never guessed from the content.

### `rowsAreQuestions`

| (unused)        | User 1 | User 2 | ... |
|-----------------|--------|--------|-----|
| Question 1      | answer | answer |     |
| Question 2      | answer |        |     |

The first row holds the user identifiers, starting at column B. Every following
row with a question in column A is one question. Rows without a question are
skipped and do not take a number: the questions are numbered in the order in
which they are found.

A column without an identifier in the first row gets the address of that header
cell as identifier (`B1`, `C1`, ...), so all the answers of one column share it.

### `rowsAreUsers`

| (label) | Question 1 | Question 2 | ... |
|---------|------------|------------|-----|
| User 1  | answer     | answer     |     |
| User 2  |            | answer     |     |

The first row holds the questions, starting at column B. It must have at least two
columns. Columns without a question are skipped and the questions are numbered
from left to right. Every following row is one user, with the identifier in
column A.

A row without an identifier gets the address of its column A cell as identifier
(`A2`, `A3`, ...).

Note that the two layouts do not build the missing identifiers in the same way:
the first one uses the header cell of the column, the second one the first cell
of the row.

## Canonical text

```text
--- Q1: How satisfied are you? ---
[User 1] Very satisfied.
[B1] Not really.

--- Q2: What should we add? ---
[User 1] Dark mode.

```

The text can be edited by hand before the analysis. The analysis service finds
the question blocks from the `--- Q<n>: ... ---` lines.

Questions, identifiers and answers are written as they are in the sheet, line
breaks included. A header is only read at the start of a block, that is at the
start of the text or after a blank line. It ends at the first line that ends with
` ---`, so a question written on several lines stays one header.

## Analysis responses

The service is asked for JSON that follows the output schema of
[`crate::analysis::analysis_result_shape`]. The response is accepted once:
* a code fence around it (` ```json ... ``` `) has been removed,
* it parses as JSON,
* every field of the schema is present with the right kind (text, integer, list, object).

The flowchart (`logicDiagramMermaid`) is then cleaned up: code fences are removed, and
if it has edges (`-->`) but does not start with `graph` or `flowchart`, the header
`graph TD` is added in front.

*/
