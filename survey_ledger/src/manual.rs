/*!

This is the long-form manual for `survey_ledger` and `activity-survey`.

## The dataset

All the submissions are kept in one Excel file (by default `data/responses.xlsx`),
in a single worksheet called `الردود` that is displayed right-to-left.
The first row is the header, every following row is one submission, oldest first.

The columns always appear in this order:

| column                    | form field              | when no activity is reported |
|---------------------------|-------------------------|------------------------------|
| البريد الإلكتروني          | `employeeEmail`         | (required)                   |
| اسم القطاع                | `sector`                | (required)                   |
| الإدارة التنفيذية          | `department`            | (required)                   |
| الإدارة                   | `division`              | (required)                   |
| القسم                     | `section`               | (required)                   |
| هل توجد أنشطة؟            | `hasActivities`         | `لا يوجد` (`نعم` otherwise)   |
| موضوع النشاط              | `activityTopic`         | `لا يوجد`                    |
| نوع النشاط                | `activityType`          | `لا يوجد`                    |
| هدف استراتيجي 1           | `strategicGoalLevel1`   | `لا يوجد`                    |
| هدف استراتيجي 2           | `strategicGoalLevel2`   | `لا يوجد`                    |
| تصنيف المقدم              | `presenterCategory`     | `لا يوجد`                    |
| تاريخ بداية النشاط         | `activityStartDate`     | `لا يوجد`                    |
| تاريخ نهاية النشاط         | `activityEndDate`       | `لا يوجد`                    |
| اسم المقدم                | `presenterName`         | `لا يوجد`                    |
| مسؤول الحضور              | `attendanceResponsible` | `لا يوجد`                    |
| الفئة المستهدفة (النوع)    | `targetAudienceType`    | `لا يوجد`                    |
| الفئة المستهدفة (تفاصيل)   | `targetAudienceDetails` | `لا يوجد`                    |
| عدد الحضور                | `attendeeCount`         | `0`                          |
| مدة النشاط (ساعة)         | `activityDuration`      | `0`                          |
| مكان الحفظ                | `contentLocation`       | `لا يوجد`                    |
| تاريخ الإرسال             | (set when received)     | (always filled)              |

The activity fields are only read when `hasActivities` is `yes`. Any other value
replaces all of them with the placeholder, even if the form sent something.

## Recording a submission

```text
activity-survey record --form submission.json
activity-survey record --field employeeEmail=a@example.org --field sector=...
```

The form file is a flat JSON object with the field names above. Fields given with `--field`
take precedence over the file.

The whole file is read, the new row is appended and the file is written again
through a temporary file, so that an interrupted write never leaves a truncated file.
Columns of the existing file that are not part of the list above are dropped.

## Finding duplicates

```text
activity-survey audit data/responses.xlsx
```

Two rows describe the same activity when they agree on the start date, the end date,
the sector, the executive department, the department, the topic, the presenter and the
audience details. Before comparing, the last three are trimmed and the letters `أ`, `إ`
and `آ` are replaced by `ا`. The first row of a group is kept as is, all the later
ones are highlighted in red. The normalized values are written back to the file.

When no duplicate is found, the file is not touched.

## Configuration

Both commands accept `--config <file.json>`. All the keys are optional:

```json
{
  "dataPath": "data/responses.xlsx",
  "sheetName": "الردود",
  "onCorruptDataset": "abort",
  "duplicateFillColor": "#FFC7CE"
}
```

- `onCorruptDataset`: what `record` does when the existing file cannot be read.
  `abort` (default) refuses the submission and leaves the file untouched.
  `overwrite` replaces the file with a dataset holding only the new submission:
  all the previous rows are lost.

 */
